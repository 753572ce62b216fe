//! Auth interceptor: metadata extraction, timestamp pre-validation,
//! signature verification, principal propagation.
//!
//! Structurally the same shape as a conventional HMAC auth middleware
//! (header extraction -> timestamp check -> signature check -> attach
//! identity), generalized to the derived-key signer and the
//! active/inactive credential lifecycle. The method-name allowlist
//! (`CreateAccessKey`/`VerifyAccessKey` bypass authentication entirely) is
//! realized by mounting those two routes on a router this middleware is
//! never layered onto, rather than by a runtime check here.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use iam_core::IamError;
use tracing::warn;

const TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const PRE_VALIDATION_WINDOW_SECS: i64 = 5 * 60;

/// Authenticates a protected request.
///
/// Extracts the four signature-envelope fields from request headers
/// (`access-key-id`, `signature`, `x-iam-date`, `request-data`), rejects a
/// timestamp outside a tight +/-5 minute window before touching storage,
/// then delegates credential lookup and signature verification to
/// [`iam_service::CredentialService::verify`]. On success, attaches the
/// resolved principal to the request's extensions for downstream handlers.
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let access_key_id = extract_header(&headers, "access-key-id")?;
    let signature = extract_header(&headers, "signature")?;
    let timestamp = extract_header(&headers, "x-iam-date")?;
    let request_data = extract_header(&headers, "request-data")?;

    validate_timestamp_window(&timestamp)?;

    let principal = state
        .credentials
        .verify(&access_key_id, &signature, &timestamp, &request_data)
        .await?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn extract_header(headers: &HeaderMap, name: &str) -> Result<String, AuthError> {
    headers
        .get(name)
        .ok_or_else(|| AuthError(IamError::unauthenticated("missing authentication parameters")))?
        .to_str()
        .map(str::to_string)
        .map_err(|_| AuthError(IamError::unauthenticated("missing authentication parameters")))
}

fn validate_timestamp_window(timestamp: &str) -> Result<(), AuthError> {
    let naive = NaiveDateTime::parse_from_str(timestamp, TIME_FORMAT)
        .map_err(|_| AuthError(IamError::unauthenticated("invalid or expired timestamp")))?;
    let signed_at = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
    let drift = (Utc::now() - signed_at).num_seconds().abs();
    if drift > PRE_VALIDATION_WINDOW_SECS {
        return Err(AuthError(IamError::unauthenticated("invalid or expired timestamp")));
    }
    Ok(())
}

/// Wraps the domain error the interceptor raised so it can render an HTTP
/// response. The interceptor emits only `Unauthenticated` or
/// `PermissionDenied`.
#[derive(Debug)]
pub struct AuthError(IamError);

impl From<IamError> for AuthError {
    fn from(err: IamError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IamError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        };

        warn!(error = %self.0, "authentication failed");

        (status, self.0.to_string()).into_response()
    }
}
