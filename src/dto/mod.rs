/// Health check payloads.
pub mod health;
/// Movie payload validation.
pub mod movie;
/// Room action requests and responses.
pub mod room;
/// Events pushed over SSE.
pub mod sse;
/// Text sanitisation helpers.
pub mod validation;
