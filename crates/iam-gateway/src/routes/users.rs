//! User management handlers: `CreateUser`, `GetUser`, `AttachUserPolicy`.

use super::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use iam_core::types::User;
use serde::{Deserialize, Serialize};

/// Request body for `CreateUser`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Unique name, 3-32 chars, `[A-Za-z0-9_-]`.
    pub name: String,
    /// Mutable display name.
    pub display_name: String,
    /// Unique email address.
    pub email: String,
}

/// Wire representation of a [`User`].
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Surrogate identifier.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// Mutable display name.
    pub display_name: String,
    /// Unique email address.
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self { id: user.id, name: user.name, display_name: user.display_name, email: user.email }
    }
}

/// `POST /v1/users` - `CreateUser`.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.create_user(&req.name, &req.display_name, &req.email).await?;
    Ok(Json(UserResponse::from(user)))
}

/// `GET /v1/users/:name` - `GetUser`.
pub async fn get_user(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get_user(&name).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Request body for `AttachUserPolicy`.
#[derive(Debug, Deserialize)]
pub struct AttachPolicyRequest {
    /// The policy's surrogate id.
    pub policy_id: i64,
}

/// `POST /v1/users/:name/policies` - `AttachUserPolicy`. Invalidates the
/// policy engine's decision cache wholesale on success.
pub async fn attach_user_policy(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<AttachPolicyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get_user(&name).await?;
    state.users.attach_policy(user.id, req.policy_id).await?;
    state.engine.invalidate().await;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
