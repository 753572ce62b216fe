//! # IAM Crypto
//!
//! HMAC-SHA256 and SHA-256 primitives, AES-256-GCM at-rest encryption, and
//! the master-key rotation manager used to protect stored access-key
//! secrets.
//!
//! ## Modules
//!
//! - [`primitives`]: HMAC/SHA-256/AES-256-GCM building blocks
//! - [`master_key`]: Current-plus-previous master-key rotation

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod master_key;
pub mod primitives;

pub use master_key::MasterKeyHandle;
pub use primitives::{constant_time_eq, decrypt, encrypt, hmac_sha256, sha256};
