//! Credential service: generates and manages access-key pairs.
//!
//! Key generation is sized to always land on the documented 20 and 40
//! character widths (see [`generate_access_key_id`]).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use iam_core::types::AccessKey;
use iam_core::IamError;
use iam_crypto::MasterKeyHandle;
use iam_storage::{AccessKeyStore, UserStore};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

const EXPIRY_DAYS: i64 = 90;

/// The authenticated principal recovered from a verified signature: the
/// result of [`CredentialService::verify`], attached to a request by the
/// auth interceptor and read back by handlers that need the caller's
/// identity (`CheckPermission`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPrincipal {
    /// The owning user's surrogate id, used as the policy engine's lookup
    /// key.
    pub user_id: i64,
    /// The owning user's unique name.
    pub user_name: String,
    /// The access key presented with the request.
    pub access_key_id: String,
}

/// Generates the 20-character public access-key identifier: 15 random
/// bytes, URL-safe base64 with no padding (15 bytes encodes to exactly 20
/// characters, so no truncation is needed).
///
/// The original Go source generates 10 bytes and slices the result to 20
/// characters, but base64 of 10 bytes is only 14 characters — that slice
/// panics. 15 bytes is the smallest byte count that actually produces 20.
fn generate_access_key_id() -> Result<String, IamError> {
    let mut bytes = [0u8; 15];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| IamError::internal("generate_access_key_id", "rng failure"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generates the 40-character plaintext secret: 30 random bytes, URL-safe
/// base64 with no padding.
fn generate_secret_access_key() -> Result<String, IamError> {
    let mut bytes = [0u8; 30];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| IamError::internal("generate_secret_access_key", "rng failure"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Generates and manages long-lived access-key pairs.
pub struct CredentialService {
    access_keys: Arc<dyn AccessKeyStore>,
    users: Arc<dyn UserStore>,
    master_key: MasterKeyHandle,
}

impl CredentialService {
    /// Wires the service against its collaborators.
    pub fn new(
        access_keys: Arc<dyn AccessKeyStore>,
        users: Arc<dyn UserStore>,
        master_key: MasterKeyHandle,
    ) -> Self {
        Self { access_keys, users, master_key }
    }

    /// Creates a new access key for `user_name`. Returns the plaintext
    /// secret exactly once, in `secret_access_key`.
    ///
    /// # Errors
    ///
    /// Returns `IamError::NotFound` if no such user exists, or whatever
    /// the store/crypto layers surface.
    pub async fn create(&self, user_name: &str) -> Result<AccessKey, IamError> {
        let user = self.users.get_by_name(user_name).await?;

        let access_key_id = generate_access_key_id()?;
        let secret = generate_secret_access_key()?;
        let encrypted_secret = self.master_key.encrypt(secret.as_bytes()).await?;
        let expires_at = Utc::now() + Duration::days(EXPIRY_DAYS);

        let mut created = self
            .access_keys
            .create(user.id, &access_key_id, &encrypted_secret, expires_at)
            .await?;
        created.secret_access_key = Some(secret);
        Ok(created)
    }

    /// Lists every access key owned by `user_name`. Secrets are never
    /// populated on this path.
    ///
    /// # Errors
    ///
    /// Returns `IamError::NotFound` if no such user exists.
    pub async fn list(&self, user_name: &str) -> Result<Vec<AccessKey>, IamError> {
        let user = self.users.get_by_name(user_name).await?;
        self.access_keys.list_by_user(user.id).await
    }

    /// Sets a key's activation status and returns the updated row.
    ///
    /// # Errors
    ///
    /// Returns `IamError::InvalidArgument` if `status` is neither
    /// `"active"` nor `"inactive"`.
    pub async fn update_status(&self, access_key_id: &str, status: &str) -> Result<AccessKey, IamError> {
        if iam_core::types::KeyStatus::parse(status).is_none() {
            return Err(IamError::invalid_argument(
                "status",
                "must be either 'active' or 'inactive'",
            ));
        }
        self.access_keys.update_status(access_key_id, status).await?;
        self.access_keys.get_by_access_key_id(access_key_id).await
    }

    /// Rotates a key's secret under the current master key. Returns the
    /// plaintext secret exactly once.
    ///
    /// # Errors
    ///
    /// Returns `IamError::NotFound` if no such key exists.
    pub async fn rotate(&self, access_key_id: &str) -> Result<AccessKey, IamError> {
        let secret = generate_secret_access_key()?;
        let encrypted_secret = self.master_key.encrypt(secret.as_bytes()).await?;
        let mut rotated = self.access_keys.rotate(access_key_id, &encrypted_secret).await?;
        rotated.secret_access_key = Some(secret);
        Ok(rotated)
    }

    /// Fetches a key by its public identifier, joining with the user
    /// store to populate `user_name`.
    ///
    /// # Errors
    ///
    /// Returns `IamError::NotFound` if no such key or owning user exists.
    pub async fn get(&self, access_key_id: &str) -> Result<AccessKey, IamError> {
        let mut key = self.access_keys.get_by_access_key_id(access_key_id).await?;
        let user = self.users.get_by_id(key.user_id).await?;
        key.user_name = Some(user.name);
        Ok(key)
    }

    /// Verifies a presented signature envelope and resolves the calling
    /// principal: fetches the credential, rejects an inactive key,
    /// decrypts the stored secret under the master key, and checks the
    /// signature via the signer. Implements steps 4-7 of the auth
    /// interceptor; steps 1-3 (method allowlist, metadata presence, the
    /// tighter +/-5 minute pre-validation window) are the gateway's
    /// concern since they depend on transport metadata this service layer
    /// does not see.
    ///
    /// # Errors
    ///
    /// Returns `IamError::Unauthenticated` if the access key is unknown or
    /// the signature does not verify (these two cases are deliberately
    /// indistinguishable from the caller's perspective), or
    /// `IamError::PermissionDenied` if the key is inactive.
    pub async fn verify(
        &self,
        access_key_id: &str,
        signature: &str,
        timestamp: &str,
        request_data: &str,
    ) -> Result<VerifiedPrincipal, IamError> {
        let key = self
            .access_keys
            .get_by_access_key_id(access_key_id)
            .await
            .map_err(|_| IamError::unauthenticated("invalid access key"))?;

        if key.status != iam_core::types::KeyStatus::Active {
            return Err(IamError::permission_denied("access key is inactive"));
        }

        let secret_bytes = self.master_key.decrypt_any(&key.encrypted_secret).await?;
        let secret = String::from_utf8(secret_bytes).map_err(|_| {
            IamError::internal("credential_service.verify", "decrypted secret is not valid utf-8")
        })?;

        let valid = iam_signer::verify(signature, request_data, timestamp, &secret).unwrap_or(false);
        if !valid {
            return Err(IamError::unauthenticated("signature verification failed"));
        }

        let user = self.users.get_by_id(key.user_id).await?;
        Ok(VerifiedPrincipal {
            user_id: user.id,
            user_name: user.name,
            access_key_id: access_key_id.to_string(),
        })
    }

    /// Rotates every access key whose `created_at` is older than 90 days.
    /// Per-key failures are logged and do not halt the sweep.
    pub async fn sweep_expired(&self) -> Result<(), IamError> {
        let keys = self.access_keys.list_all().await?;
        let cutoff = Utc::now() - Duration::days(EXPIRY_DAYS);

        for key in keys {
            if key.created_at >= cutoff {
                continue;
            }
            if let Err(err) = self.rotate(&key.access_key_id).await {
                tracing::warn!(
                    access_key_id = %key.access_key_id,
                    error = %err,
                    "failed to rotate expired access key during sweep"
                );
            }
        }
        Ok(())
    }
}
