use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the session store answers within its deadline.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state
        .with_store_timeout(state.rooms().health_check())
        .await
    {
        Ok(()) => HealthResponse::ok(),
        Err(err) => {
            warn!(error = %err, "session store health check failed");
            HealthResponse::degraded()
        }
    }
}
