use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether predictions can currently be stored, logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_prediction_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let resolved = state.official_results().len();
    if state.is_degraded() {
        HealthResponse::degraded(resolved)
    } else {
        HealthResponse::ok(resolved)
    }
}
