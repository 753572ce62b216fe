//! # IAM Core Gateway
//!
//! HTTP façade exposing the IAM RPC surface over an
//! Axum router: user, policy, and access-key management plus permission
//! checks.
//!
//! ## Features
//!
//! - Derived-key HMAC-SHA256 request authentication
//! - Security headers on every response
//! - Health check endpoints
//! - Graceful shutdown
//!
//! ## Compliance
//!
//! - No unwrap/panic in production code
//! - Explicit error handling
//! - Bounded request sizes (Axum defaults)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

mod health;
mod middleware;
mod routes;
mod shutdown;
mod state;

use axum::{routing::get, Router};
use iam_core::config::{AppConfig, SecretConfig};
use iam_core::IamError;
use state::AppState;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), IamError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting IAM Core Gateway...");

    let config = AppConfig::from_env()?;
    let secrets = SecretConfig::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState::new(config, &secrets).await?;

    let protected = routes::protected_router()
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::authenticate));

    let app = Router::new()
        // Health check routes (no authentication required).
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        // Public RPC methods (CreateAccessKey, VerifyAccessKey).
        .merge(routes::public_router())
        // Every other RPC method, behind the auth interceptor.
        .merge(protected)
        // Global middleware.
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::correlation_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| IamError::internal("gateway.bind", e.to_string()))?;

    info!(%addr, "gateway listening");
    info!("API endpoints:");
    info!("  GET   /health                               - liveness probe");
    info!("  GET   /health/ready                          - readiness probe");
    info!("  POST  /v1/users                              - create user (auth required)");
    info!("  GET   /v1/users/:name                        - get user (auth required)");
    info!("  POST  /v1/users/:name/policies               - attach policy (auth required)");
    info!("  POST  /v1/policies                           - create policy (auth required)");
    info!("  POST  /v1/access-keys                        - create access key (public)");
    info!("  GET   /v1/users/:name/access-keys            - list access keys (auth required)");
    info!("  PATCH /v1/access-keys/:access_key_id/status  - update access key status (auth required)");
    info!("  POST  /v1/access-keys/verify                 - verify access key signature (public)");
    info!("  POST  /v1/check-permission                   - evaluate policy (auth required)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .map_err(|e| IamError::internal("gateway.serve", e.to_string()))?;

    info!("gateway shutdown complete");

    Ok(())
}
