/// OpenAPI documentation generation.
pub mod documentation;
/// Background purge of expired rooms and idle gates.
pub mod expiry_sweeper;
/// Health check service.
pub mod health_service;
/// Room lifecycle, nomination and voting operations.
pub mod room_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
