//! `CheckPermission` handler.

use super::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use iam_service::VerifiedPrincipal;
use serde::{Deserialize, Serialize};

/// Request body for `CheckPermission`.
#[derive(Debug, Deserialize)]
pub struct CheckPermissionRequest {
    /// The action being attempted, e.g. `"ecs:StartInstance"`.
    pub action: String,
    /// The target resource ARN.
    pub resource: String,
}

/// Response body for `CheckPermission`.
#[derive(Debug, Serialize)]
pub struct CheckPermissionResponse {
    /// The policy engine's actual verdict for this action/resource pair.
    /// `false` is a normal, successful evaluation result, not an error.
    pub allowed: bool,
}

/// `POST /v1/check-permission` - `CheckPermission`. Evaluates the calling
/// principal's bound policies via the policy engine.
pub async fn check_permission(
    State(state): State<AppState>,
    Extension(principal): Extension<VerifiedPrincipal>,
    Json(req): Json<CheckPermissionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let allowed = state.engine.evaluate(principal.user_id, &req.action, &req.resource).await?;
    Ok(Json(CheckPermissionResponse { allowed }))
}
