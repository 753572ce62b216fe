//! # IAM Core
//!
//! Shared types, error handling, configuration, and validation for the IAM
//! service: the trust and access machinery specified independently of any
//! particular transport or storage backend.
//!
//! ## TigerStyle Compliance
//!
//! This crate follows TigerStyle principles:
//! - **Safety**: No unwrap, panic, or unsafe code
//! - **Simplicity**: Explicit error handling with Result types
//! - **Correctness**: Type-driven design with validation
//!
//! ## Modules
//!
//! - [`error`]: The domain-neutral error taxonomy
//! - [`config`]: Configuration and secrets management
//! - [`types`]: Core domain types (`User`, `Policy`, `AccessKey`, ...)
//! - [`validation`]: Admission-time validation shared by the services

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, LogConfig, Secret, SecretConfig};
pub use error::IamError;
