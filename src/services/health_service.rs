use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the degraded flag, logging store connectivity issues on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.league_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "league store health check failed");
            }
        }
        None => warn!("league store unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
