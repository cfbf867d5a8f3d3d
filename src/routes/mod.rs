use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Health check route.
pub mod health;
/// Room action routes.
pub mod rooms;
/// Room event stream route.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(rooms::router())
        .merge(sse::router());

    api_router.merge(docs::router()).with_state(state)
}
