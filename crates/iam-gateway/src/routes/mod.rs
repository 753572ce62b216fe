//! RPC method to HTTP route wiring.

mod access_keys;
mod permissions;
mod policies;
mod users;

use crate::state::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::Router;
use iam_core::IamError;

/// Routes that bypass the auth interceptor: `CreateAccessKey` and
/// `VerifyAccessKey`. `CreateAccessKey` is expected to sit behind a
/// higher-level trust boundary in deployment (e.g. a network ACL); this
/// façade does not enforce one itself.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/v1/access-keys", post(access_keys::create_access_key))
        .route("/v1/access-keys/verify", post(access_keys::verify_access_key))
}

/// Every other route in the RPC surface. The caller mounts this behind
/// the auth interceptor.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(users::create_user))
        .route("/v1/users/:name", get(users::get_user))
        .route("/v1/users/:name/policies", post(users::attach_user_policy))
        .route("/v1/policies", post(policies::create_policy))
        .route("/v1/users/:name/access-keys", get(access_keys::list_access_keys))
        .route(
            "/v1/access-keys/:access_key_id/status",
            patch(access_keys::update_access_key_status),
        )
        .route("/v1/check-permission", post(permissions::check_permission))
}

/// Maps a domain error to its transport status code one-to-one.
#[derive(Debug)]
struct ApiError(IamError);

impl From<IamError> for ApiError {
    fn from(err: IamError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IamError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            IamError::NotFound { .. } => StatusCode::NOT_FOUND,
            IamError::AlreadyExists { .. } => StatusCode::CONFLICT,
            IamError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            IamError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            IamError::FailedPrecondition { .. } => StatusCode::PRECONDITION_FAILED,
            IamError::Internal { .. } | IamError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, axum::Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
