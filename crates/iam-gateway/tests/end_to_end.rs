//! End-to-end scenarios covering credential issuance, signature
//! verification, and policy evaluation, run against in-memory fake
//! stores instead of a live Postgres instance so they run
//! unconditionally rather than behind `#[ignore]`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use iam_core::types::{AccessKey, KeyStatus, Policy, User};
use iam_core::IamError;
use iam_crypto::MasterKeyHandle;
use iam_policy::{PolicyEngine, PolicyLookup};
use iam_service::{CredentialService, PolicyService, UserService};
use iam_storage::{AccessKeyStore, PolicyStore, UserStore};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::Arc;

/// A single in-memory backend implementing every store trait, so
/// [`UserStore`], [`PolicyStore`], and [`AccessKeyStore`] handles can all
/// be carved out of one `Arc` the way the Postgres-backed stores all sit
/// on one connection pool.
struct FakeStore {
    users: Mutex<Vec<User>>,
    policies: Mutex<Vec<Policy>>,
    bindings: Mutex<HashSet<(i64, i64)>>,
    access_keys: Mutex<HashMap<String, AccessKey>>,
    next_user_id: Mutex<i64>,
    next_policy_id: Mutex<i64>,
    next_key_id: Mutex<i64>,
}

impl FakeStore {
    fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            policies: Mutex::new(Vec::new()),
            bindings: Mutex::new(HashSet::new()),
            access_keys: Mutex::new(HashMap::new()),
            next_user_id: Mutex::new(1),
            next_policy_id: Mutex::new(1),
            next_key_id: Mutex::new(1),
        }
    }
}

#[async_trait]
impl UserStore for FakeStore {
    async fn create(&self, name: &str, display_name: &str, email: &str) -> Result<User, IamError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.name == name || u.email == email) {
            return Err(IamError::already_exists("user", name));
        }
        let mut next_id = self.next_user_id.lock().unwrap();
        let user = User {
            id: *next_id,
            name: name.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        *next_id += 1;
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User, IamError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| IamError::not_found("user", id.to_string()))
    }

    async fn get_by_name(&self, name: &str) -> Result<User, IamError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.name == name)
            .cloned()
            .ok_or_else(|| IamError::not_found("user", name))
    }

    async fn get_by_email(&self, email: &str) -> Result<User, IamError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| IamError::not_found("user", email))
    }

    async fn list(&self) -> Result<Vec<User>, IamError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update(&self, id: i64, display_name: &str, email: &str) -> Result<User, IamError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| IamError::not_found("user", id.to_string()))?;
        user.display_name = display_name.to_string();
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), IamError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(IamError::not_found("user", id.to_string()));
        }
        self.bindings.lock().unwrap().retain(|(u, _)| *u != id);
        Ok(())
    }

    async fn attach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError> {
        let mut bindings = self.bindings.lock().unwrap();
        if !bindings.insert((user_id, policy_id)) {
            return Err(IamError::already_exists(
                "user_policy_binding",
                format!("{user_id}:{policy_id}"),
            ));
        }
        Ok(())
    }

    async fn detach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError> {
        self.bindings.lock().unwrap().remove(&(user_id, policy_id));
        Ok(())
    }

    async fn list_policies(&self, user_id: i64) -> Result<Vec<Policy>, IamError> {
        let bindings = self.bindings.lock().unwrap();
        let policies = self.policies.lock().unwrap();
        Ok(policies
            .iter()
            .filter(|p| bindings.contains(&(user_id, p.id)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PolicyStore for FakeStore {
    async fn create(&self, name: &str, description: &str, policy_document: &str) -> Result<Policy, IamError> {
        let mut policies = self.policies.lock().unwrap();
        if policies.iter().any(|p| p.name == name) {
            return Err(IamError::already_exists("policy", name));
        }
        let mut next_id = self.next_policy_id.lock().unwrap();
        let policy = Policy {
            id: *next_id,
            name: name.to_string(),
            description: description.to_string(),
            policy_document: policy_document.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        *next_id += 1;
        policies.push(policy.clone());
        Ok(policy)
    }

    async fn get_by_id(&self, id: i64) -> Result<Policy, IamError> {
        self.policies
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| IamError::not_found("policy", id.to_string()))
    }

    async fn get_by_name(&self, name: &str) -> Result<Policy, IamError> {
        self.policies
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| IamError::not_found("policy", name))
    }

    async fn list(&self) -> Result<Vec<Policy>, IamError> {
        Ok(self.policies.lock().unwrap().clone())
    }

    async fn update(&self, id: i64, description: &str, policy_document: &str) -> Result<Policy, IamError> {
        let mut policies = self.policies.lock().unwrap();
        let policy = policies
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| IamError::not_found("policy", id.to_string()))?;
        policy.description = description.to_string();
        policy.policy_document = policy_document.to_string();
        policy.updated_at = Utc::now();
        Ok(policy.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), IamError> {
        let mut policies = self.policies.lock().unwrap();
        let before = policies.len();
        policies.retain(|p| p.id != id);
        if policies.len() == before {
            return Err(IamError::not_found("policy", id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccessKeyStore for FakeStore {
    async fn create(
        &self,
        user_id: i64,
        access_key_id: &str,
        encrypted_secret: &[u8],
        expires_at: DateTime<Utc>,
    ) -> Result<AccessKey, IamError> {
        let mut keys = self.access_keys.lock().unwrap();
        if keys.contains_key(access_key_id) {
            return Err(IamError::already_exists("access_key", access_key_id));
        }
        let mut next_id = self.next_key_id.lock().unwrap();
        let key = AccessKey {
            id: *next_id,
            user_id,
            access_key_id: access_key_id.to_string(),
            encrypted_secret: encrypted_secret.to_vec(),
            secret_access_key: None,
            status: KeyStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            expires_at: Some(expires_at),
            last_rotated_at: None,
            user_name: None,
        };
        *next_id += 1;
        keys.insert(access_key_id.to_string(), key.clone());
        Ok(key)
    }

    async fn get_by_id(&self, id: i64) -> Result<AccessKey, IamError> {
        self.access_keys
            .lock()
            .unwrap()
            .values()
            .find(|k| k.id == id)
            .cloned()
            .ok_or_else(|| IamError::not_found("access_key", id.to_string()))
    }

    async fn get_by_access_key_id(&self, access_key_id: &str) -> Result<AccessKey, IamError> {
        self.access_keys
            .lock()
            .unwrap()
            .get(access_key_id)
            .cloned()
            .ok_or_else(|| IamError::not_found("access_key", access_key_id))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccessKey>, IamError> {
        Ok(self
            .access_keys
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<AccessKey>, IamError> {
        Ok(self.access_keys.lock().unwrap().values().cloned().collect())
    }

    async fn update_status(&self, access_key_id: &str, status: &str) -> Result<(), IamError> {
        let mut keys = self.access_keys.lock().unwrap();
        let key = keys
            .get_mut(access_key_id)
            .ok_or_else(|| IamError::not_found("access_key", access_key_id))?;
        key.status = KeyStatus::parse(status).ok_or_else(|| {
            IamError::invalid_argument("status", "must be either 'active' or 'inactive'")
        })?;
        key.updated_at = Utc::now();
        Ok(())
    }

    async fn rotate(&self, access_key_id: &str, new_encrypted_secret: &[u8]) -> Result<AccessKey, IamError> {
        let mut keys = self.access_keys.lock().unwrap();
        let key = keys
            .get_mut(access_key_id)
            .ok_or_else(|| IamError::not_found("access_key", access_key_id))?;
        key.encrypted_secret = new_encrypted_secret.to_vec();
        key.last_rotated_at = Some(Utc::now());
        key.updated_at = Utc::now();
        Ok(key.clone())
    }
}

struct StorePolicyLookup {
    users: Arc<dyn UserStore>,
}

#[async_trait]
impl PolicyLookup for StorePolicyLookup {
    async fn policies_for_user(&self, user_id: i64) -> Result<Vec<Policy>, IamError> {
        self.users.list_policies(user_id).await
    }
}

/// Everything the scenarios below need, wired exactly as
/// `iam-gateway::state::AppState` wires the real Postgres-backed stores.
struct Harness {
    users: UserService,
    policies: PolicyService,
    credentials: CredentialService,
    engine: PolicyEngine<StorePolicyLookup>,
    master_key: MasterKeyHandle,
}

fn harness() -> Harness {
    let store = Arc::new(FakeStore::new());
    let users_store: Arc<dyn UserStore> = store.clone();
    let policies_store: Arc<dyn PolicyStore> = store.clone();
    let access_keys_store: Arc<dyn AccessKeyStore> = store.clone();
    let master_key = MasterKeyHandle::new([42u8; 32]);

    Harness {
        users: UserService::new(users_store.clone()),
        policies: PolicyService::new(policies_store),
        credentials: CredentialService::new(access_keys_store, users_store.clone(), master_key.clone()),
        engine: PolicyEngine::new(StorePolicyLookup { users: users_store }),
        master_key,
    }
}

fn timestamp_now() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Scenario 1: create a user and an access key, sign a request, and
/// verify it resolves the correct principal.
#[tokio::test]
async fn scenario_create_sign_verify() {
    let h = harness();
    h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let key = h.credentials.create("testuser").await.unwrap();
    assert_eq!(key.access_key_id.len(), 20);
    let secret = key.secret_access_key.clone().unwrap();

    let timestamp = timestamp_now();
    let request_data = r#"{"name":"testuser"}"#;
    let signature = iam_signer::sign(&secret, request_data, &timestamp).unwrap();

    let principal = h
        .credentials
        .verify(&key.access_key_id, &signature, &timestamp, request_data)
        .await
        .unwrap();
    assert_eq!(principal.user_name, "testuser");
}

/// Scenario 2: a signature computed at a timestamp outside the signer's
/// +/-15 minute window is rejected as unauthenticated.
#[tokio::test]
async fn scenario_expired_signature() {
    let h = harness();
    h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let key = h.credentials.create("testuser").await.unwrap();
    let secret = key.secret_access_key.clone().unwrap();

    let stale_timestamp = (Utc::now() - Duration::minutes(20)).format("%Y%m%dT%H%M%SZ").to_string();
    let request_data = r#"{"name":"testuser"}"#;
    let signature = iam_signer::sign(&secret, request_data, &stale_timestamp).unwrap();

    let result = h.credentials.verify(&key.access_key_id, &signature, &stale_timestamp, request_data).await;
    assert!(matches!(result, Err(IamError::Unauthenticated { .. })));
}

/// Scenario 3: deactivating a key causes a subsequent authenticated call
/// to fail with permission-denied, not unauthenticated.
#[tokio::test]
async fn scenario_inactive_key_is_permission_denied() {
    let h = harness();
    h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let key = h.credentials.create("testuser").await.unwrap();
    let secret = key.secret_access_key.clone().unwrap();

    h.credentials.update_status(&key.access_key_id, "inactive").await.unwrap();

    let timestamp = timestamp_now();
    let request_data = "some request body";
    let signature = iam_signer::sign(&secret, request_data, &timestamp).unwrap();

    let result = h.credentials.verify(&key.access_key_id, &signature, &timestamp, request_data).await;
    assert!(matches!(result, Err(IamError::PermissionDenied { .. })));
}

/// Scenario 4: a user bound to a policy granting `ecs:*` on `*` is
/// allowed to start an ECS instance.
#[tokio::test]
async fn scenario_policy_allow() {
    let h = harness();
    let user = h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let policy = h
        .policies
        .create(
            "ecs-admin",
            "full ECS access",
            r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
        )
        .await
        .unwrap();
    h.users.attach_policy(user.id, policy.id).await.unwrap();
    h.engine.invalidate().await;

    let allowed = h
        .engine
        .evaluate(user.id, "ecs:StartInstance", "acs:ecs:cn:1:instance/i")
        .await
        .unwrap();
    assert!(allowed);
}

/// Scenario 5: the same user has no statement matching an unrelated
/// action, so the engine default-denies.
#[tokio::test]
async fn scenario_default_deny() {
    let h = harness();
    let user = h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let policy = h
        .policies
        .create(
            "ecs-admin",
            "full ECS access",
            r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
        )
        .await
        .unwrap();
    h.users.attach_policy(user.id, policy.id).await.unwrap();
    h.engine.invalidate().await;

    let allowed = h.engine.evaluate(user.id, "s3:GetObject", "acs:s3:::bucket/key").await.unwrap();
    assert!(!allowed);
}

/// Scenario 6: master-key rotation. A secret encrypted under the initial
/// master key keeps verifying across one rotation (the previous-key
/// fallback), but is unrecoverable once a third rotation evicts that key
/// from the retained set.
#[tokio::test]
async fn scenario_master_key_rotation() {
    let h = harness();
    h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let key = h.credentials.create("testuser").await.unwrap();
    let secret = key.secret_access_key.clone().unwrap();

    let timestamp = timestamp_now();
    let request_data = "rotation-scenario";
    let signature = iam_signer::sign(&secret, request_data, &timestamp).unwrap();

    // One rotation: the secret, encrypted under the original master key,
    // is still recoverable via the previous-key fallback, and signature
    // verification (which decrypts through the same handle) still
    // succeeds.
    h.master_key.rotate([43u8; 32]).await;
    let decrypted = h.master_key.decrypt_any(&key.encrypted_secret).await.unwrap();
    assert_eq!(decrypted, secret.as_bytes());

    let principal = h.credentials.verify(&key.access_key_id, &signature, &timestamp, request_data).await.unwrap();
    assert_eq!(principal.user_name, "testuser");

    // Two more rotations evict the key the secret was encrypted under.
    h.master_key.rotate([44u8; 32]).await;
    h.master_key.rotate([45u8; 32]).await;
    let result = h.master_key.decrypt_any(&key.encrypted_secret).await;
    assert!(matches!(result, Err(IamError::FailedPrecondition { .. })));

    // Verification now fails distinguishably (a storage invariant
    // violation, not a bad signature): the key set has been exhausted.
    let verify_result = h.credentials.verify(&key.access_key_id, &signature, &timestamp, request_data).await;
    assert!(matches!(verify_result, Err(IamError::FailedPrecondition { .. })));
}

/// A duplicate user-to-policy binding surfaces a distinct error from a
/// generic storage failure.
#[tokio::test]
async fn duplicate_policy_binding_is_already_exists() {
    let h = harness();
    let user = h.users.create_user("testuser", "Test User", "testuser@example.com").await.unwrap();
    let policy = h
        .policies
        .create("p1", "d", r#"{"Statement":[{"Effect":"Allow"}]}"#)
        .await
        .unwrap();
    h.users.attach_policy(user.id, policy.id).await.unwrap();
    let result = h.users.attach_policy(user.id, policy.id).await;
    assert!(matches!(result, Err(IamError::AlreadyExists { .. })));
}
