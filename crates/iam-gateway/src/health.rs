//! Health check endpoints for liveness and readiness probes.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

/// Liveness probe - always returns OK if the process is running.
///
/// This endpoint is used by orchestrators to determine if the process
/// should be restarted.
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe - pings the storage pool.
///
/// # Returns
///
/// - `200 OK`: storage is reachable
/// - `503 Service Unavailable`: the ping failed or timed out
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match state.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            warn!(error = %err, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
