//! Policy management handler: `CreatePolicy`.

use super::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use iam_core::types::Policy;
use serde::{Deserialize, Serialize};

/// Request body for `CreatePolicy`.
#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    /// Unique policy name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Raw JSON policy document.
    pub policy_document: String,
}

/// Wire representation of a [`Policy`].
#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    /// Surrogate identifier.
    pub id: i64,
    /// Unique policy name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Raw JSON policy document.
    pub policy_document: String,
}

impl From<Policy> for PolicyResponse {
    fn from(policy: Policy) -> Self {
        Self {
            id: policy.id,
            name: policy.name,
            description: policy.description,
            policy_document: policy.policy_document,
        }
    }
}

/// `POST /v1/policies` - `CreatePolicy`.
pub async fn create_policy(
    State(state): State<AppState>,
    Json(req): Json<CreatePolicyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let policy = state.policies.create(&req.name, &req.description, &req.policy_document).await?;
    Ok(Json(PolicyResponse::from(policy)))
}
