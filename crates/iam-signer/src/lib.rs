//! # IAM Signer
//!
//! Derived-key HMAC-SHA256 request signing and verification, following an
//! AWS SigV4-shaped key schedule with an `"IAM"` literal standing in for
//! the usual `"AWS4"` prefix.
//!
//! ## Modules
//!
//! This crate is small enough to live in a single module; see the
//! top-level functions [`sign`] and [`verify`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use iam_crypto::{constant_time_eq, hmac_sha256, sha256};
use thiserror::Error;

const AUTH_HEADER_PREFIX: &str = "IAM-HMAC-SHA256";
const TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const SIGNATURE_WINDOW_SECS: i64 = 15 * 60;

/// Errors raised while verifying a signed request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    /// The `timestamp` header does not parse as `YYYYMMDDTHHMMSSZ`.
    #[error("invalid timestamp format")]
    InvalidTimestamp,
    /// The timestamp falls outside the ±15 minute signing window.
    #[error("request expired")]
    Expired,
}

/// Parses a signer timestamp of the form `YYYYMMDDTHHMMSSZ` as UTC.
fn parse_timestamp(timestamp: &str) -> Result<DateTime<Utc>, SignerError> {
    let naive = NaiveDateTime::parse_from_str(timestamp, TIME_FORMAT)
        .map_err(|_| SignerError::InvalidTimestamp)?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// Builds the canonical string to sign: the header prefix, the raw
/// timestamp, and the base64-encoded SHA-256 digest of `request_data`,
/// newline-separated.
fn build_string_to_sign(timestamp: &str, request_data: &str) -> String {
    let digest = sha256(request_data.as_bytes());
    format!(
        "{}\n{}\n{}",
        AUTH_HEADER_PREFIX,
        timestamp,
        BASE64.encode(digest)
    )
}

/// Derives the request-scoped signing key from `secret_key` and the date
/// portion (first 8 characters) of `timestamp`, following the
/// date -> region -> service -> request derivation chain. The `"default"`
/// region and `"iam"` service segments are literals, matching the
/// original's single-region, single-service deployment.
fn derive_signing_key(secret_key: &str, date: &str) -> Result<[u8; 32], iam_core::IamError> {
    let date_key = hmac_sha256(format!("IAM{secret_key}").as_bytes(), date.as_bytes())?;
    let region_key = hmac_sha256(&date_key, b"default")?;
    let service_key = hmac_sha256(&region_key, b"iam")?;
    hmac_sha256(&service_key, b"request")
}

/// Computes the base64 HMAC-SHA256 signature for `request_data` signed at
/// `timestamp` (`YYYYMMDDTHHMMSSZ`) under `secret_key`.
///
/// # Errors
///
/// Returns `IamError::Internal` if key derivation fails.
pub fn sign(
    secret_key: &str,
    request_data: &str,
    timestamp: &str,
) -> Result<String, iam_core::IamError> {
    let string_to_sign = build_string_to_sign(timestamp, request_data);
    let date = timestamp.get(0..8).unwrap_or(timestamp);
    let signing_key = derive_signing_key(secret_key, date)?;
    let signature = hmac_sha256(&signing_key, string_to_sign.as_bytes())?;
    Ok(BASE64.encode(signature))
}

/// Verifies that `signature` is the correct signature for `request_data`
/// signed at `timestamp` under `secret_key`, and that `timestamp` falls
/// within ±15 minutes of now.
///
/// # Errors
///
/// Returns [`SignerError::InvalidTimestamp`] if `timestamp` does not parse,
/// or [`SignerError::Expired`] if it falls outside the signing window.
pub fn verify(
    signature: &str,
    request_data: &str,
    timestamp: &str,
    secret_key: &str,
) -> Result<bool, SignerError> {
    let signed_at = parse_timestamp(timestamp)?;
    let drift = (Utc::now() - signed_at).num_seconds().abs();
    if drift >= SIGNATURE_WINDOW_SECS {
        return Err(SignerError::Expired);
    }

    let expected = sign(secret_key, request_data, timestamp)
        .map_err(|_| SignerError::InvalidTimestamp)?;

    Ok(constant_time_eq(expected.as_bytes(), signature.as_bytes()))
}
