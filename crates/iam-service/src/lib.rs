//! # IAM Service
//!
//! Business logic wiring the crypto, signer, storage, and policy crates
//! into the operations the gateway dispatches to: credential lifecycle,
//! user management, and policy management.
//!
//! ## Modules
//!
//! - [`access_key`]: `CredentialService` — access-key generation, rotation,
//!   expiry sweep
//! - [`user_service`]: `UserService` and the `PolicyLookup` bridge
//! - [`policy_service`]: `PolicyService`

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod access_key;
pub mod policy_service;
pub mod user_service;

pub use access_key::{CredentialService, VerifiedPrincipal};
pub use policy_service::PolicyService;
pub use user_service::{StorePolicyLookup, UserService};
