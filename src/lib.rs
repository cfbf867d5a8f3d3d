//! Library crate for movie-night-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Persistence of room records.
pub mod dao;
/// Wire payloads.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Room actions and background tasks.
pub mod services;
/// Shared state and room domain.
pub mod state;
