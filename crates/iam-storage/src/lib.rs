//! # IAM Storage
//!
//! Postgres-backed persistence for users, policies, user-to-policy
//! bindings, and access keys, behind capability-set traits so any backend
//! satisfying them (including in-memory fakes for tests) is acceptable.
//!
//! ## Modules
//!
//! - [`pool`]: Connection pool setup, migrations, and health monitoring
//! - [`user_store`]: `UserStore` and its Postgres implementation
//! - [`policy_store`]: `PolicyStore` and its Postgres implementation
//! - [`access_key_store`]: `AccessKeyStore` and its Postgres implementation
//!
//! ## TigerStyle Compliance
//!
//! - No unwrap/panic in production code
//! - Explicit error handling
//! - Connection pooling

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod access_key_store;
pub mod policy_store;
pub mod pool;
pub mod user_store;

mod rows;

pub use access_key_store::{AccessKeyStore, PgAccessKeyStore};
pub use policy_store::{PgPolicyStore, PolicyStore};
pub use pool::Store;
pub use user_store::{PgUserStore, UserStore};
