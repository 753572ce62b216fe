//! Application state shared across handlers.
//!
//! Wires every crate in the workspace into the collaborators a request
//! handler actually calls: the three services, the policy engine, and the
//! storage pool they sit on top of.

use iam_core::config::{AppConfig, SecretConfig};
use iam_core::IamError;
use iam_crypto::MasterKeyHandle;
use iam_policy::PolicyEngine;
use iam_service::{CredentialService, PolicyService, StorePolicyLookup, UserService};
use iam_storage::{PgAccessKeyStore, PgPolicyStore, PgUserStore, Store};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Non-secret configuration (listen port, pool sizing, log settings).
    pub config: AppConfig,
    /// Access-key lifecycle operations.
    pub credentials: Arc<CredentialService>,
    /// Policy document CRUD.
    pub policies: Arc<PolicyService>,
    /// User CRUD and policy bindings.
    pub users: Arc<UserService>,
    /// Authorization decisions, backed by the policies bound to a user.
    pub engine: Arc<PolicyEngine<StorePolicyLookup>>,
    store: Store,
}

impl AppState {
    /// Connects to storage, runs pending migrations, seeds the master-key
    /// handle, and wires every service against its store.
    ///
    /// # Errors
    ///
    /// Returns `IamError::Internal` if the storage connection or
    /// migrations fail.
    pub async fn new(config: AppConfig, secrets: &SecretConfig) -> Result<Self, IamError> {
        let store = Store::connect(secrets.database_dsn.expose()).await?;
        let master_key = MasterKeyHandle::new(*secrets.master_key.expose());

        let access_keys = Arc::new(PgAccessKeyStore::new(store.clone()));
        let users_store = Arc::new(PgUserStore::new(store.clone()));
        let policies_store = Arc::new(PgPolicyStore::new(store.clone()));

        let credentials = Arc::new(CredentialService::new(access_keys, users_store.clone(), master_key));
        let users = Arc::new(UserService::new(users_store.clone()));
        let policies = Arc::new(PolicyService::new(policies_store));
        let engine = Arc::new(PolicyEngine::new(StorePolicyLookup::new(users_store)));

        Ok(Self { config, credentials, policies, users, engine, store })
    }

    /// Pings the storage pool, for the readiness probe.
    pub async fn health_check(&self) -> Result<(), IamError> {
        self.store.health_check().await
    }
}
