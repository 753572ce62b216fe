//! Access-key lifecycle handlers: `CreateAccessKey`, `ListAccessKeys`,
//! `UpdateAccessKeyStatus`, `VerifyAccessKey`.

use super::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use iam_core::types::AccessKey;
use serde::{Deserialize, Serialize};

/// Request body for `CreateAccessKey`.
#[derive(Debug, Deserialize)]
pub struct CreateAccessKeyRequest {
    /// The owning user's unique name.
    pub user_name: String,
}

/// Wire representation of an [`AccessKey`]. `secret_access_key` is
/// populated only immediately after create/rotate.
#[derive(Debug, Serialize)]
pub struct AccessKeyResponse {
    /// Public identifier.
    pub access_key_id: String,
    /// Plaintext secret, present only on create/rotate.
    pub secret_access_key: Option<String>,
    /// `"active"` or `"inactive"`.
    pub status: String,
    /// Expiry timestamp.
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<AccessKey> for AccessKeyResponse {
    fn from(key: AccessKey) -> Self {
        Self {
            access_key_id: key.access_key_id,
            secret_access_key: key.secret_access_key,
            status: key.status.as_str().to_string(),
            expires_at: key.expires_at,
        }
    }
}

/// `POST /v1/access-keys` - `CreateAccessKey`. Bypasses the auth
/// interceptor; returns the plaintext secret exactly once.
pub async fn create_access_key(
    State(state): State<AppState>,
    Json(req): Json<CreateAccessKeyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = state.credentials.create(&req.user_name).await?;
    Ok(Json(AccessKeyResponse::from(key)))
}

/// `GET /v1/users/:name/access-keys` - `ListAccessKeys`. Secrets are never
/// populated on this path.
pub async fn list_access_keys(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let keys = state.credentials.list(&name).await?;
    let response: Vec<AccessKeyResponse> = keys.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

/// Request body for `UpdateAccessKeyStatus`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// `"active"` or `"inactive"`.
    pub status: String,
}

/// `PATCH /v1/access-keys/:access_key_id/status` - `UpdateAccessKeyStatus`.
pub async fn update_access_key_status(
    State(state): State<AppState>,
    Path(access_key_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = state.credentials.update_status(&access_key_id, &req.status).await?;
    Ok(Json(AccessKeyResponse::from(key)))
}

/// Request body for `VerifyAccessKey`.
#[derive(Debug, Deserialize)]
pub struct VerifyAccessKeyRequest {
    /// The access key presented with the request.
    pub access_key_id: String,
    /// Base64 HMAC signature.
    pub signature: String,
    /// Timestamp in `YYYYMMDDTHHMMSSZ` format.
    pub timestamp: String,
    /// The canonical request bytes that were signed.
    pub request_data: String,
}

/// Response body for `VerifyAccessKey`.
#[derive(Debug, Serialize)]
pub struct VerifyAccessKeyResponse {
    /// Whether the signature verified against an active key.
    pub valid: bool,
    /// The owning user's name, present only when `valid` is `true`.
    pub user_name: Option<String>,
}

/// `POST /v1/access-keys/verify` - `VerifyAccessKey`. Bypasses the auth
/// interceptor; lets a caller self-check a signature before relying on it
/// for a protected call. Reports `valid: false` rather than propagating
/// the underlying error, matching the no-differential-disclosure rule:
/// every verification failure looks identical from here.
pub async fn verify_access_key(
    State(state): State<AppState>,
    Json(req): Json<VerifyAccessKeyRequest>,
) -> impl IntoResponse {
    match state
        .credentials
        .verify(&req.access_key_id, &req.signature, &req.timestamp, &req.request_data)
        .await
    {
        Ok(principal) => Json(VerifyAccessKeyResponse { valid: true, user_name: Some(principal.user_name) }),
        Err(_) => Json(VerifyAccessKeyResponse { valid: false, user_name: None }),
    }
}
