//! Per-request correlation id.
//!
//! Generates a fresh id for every inbound request, attaches it to the
//! request's extensions so handlers and the auth interceptor can read it
//! back, and enters a tracing span carrying it for the lifetime of the
//! request so every structured log line emitted underneath correlates to
//! one request.

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// The correlation id for the in-flight request, readable via
/// `Extension<CorrelationId>` by any handler that wants to log it
/// alongside domain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a correlation id, attaches it to the request, and runs the
/// rest of the stack inside a tracing span carrying it.
pub async fn correlation_id(mut request: Request, next: Next) -> Response {
    let id = CorrelationId(Uuid::new_v4());
    request.extensions_mut().insert(id);

    let span = tracing::info_span!("request", correlation_id = %id);
    next.run(request).instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_displays_as_uuid() {
        let id = CorrelationId(Uuid::nil());
        assert_eq!(id.to_string(), "00000000-0000-0000-0000-000000000000");
    }
}
