//! Access-key storage. Encryption/decryption of the secret happens one
//! layer up (`iam-service`, via `iam-crypto::MasterKeyHandle`); this store
//! only ever sees already-encrypted bytes.

use crate::pool::Store;
use crate::rows::AccessKeyRow;
use async_trait::async_trait;
use iam_core::types::AccessKey;
use iam_core::IamError;

/// The access-key storage contract: create, lookup by id/user, list all,
/// status toggle, and rotate, plus `list_all` to give the expiry sweep a
/// well-typed data source.
#[async_trait]
pub trait AccessKeyStore: Send + Sync {
    /// Inserts a new access key row with its pre-encrypted secret.
    async fn create(
        &self,
        user_id: i64,
        access_key_id: &str,
        encrypted_secret: &[u8],
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<AccessKey, IamError>;
    /// Fetches by surrogate id.
    async fn get_by_id(&self, id: i64) -> Result<AccessKey, IamError>;
    /// Fetches by the public access-key identifier.
    async fn get_by_access_key_id(&self, access_key_id: &str) -> Result<AccessKey, IamError>;
    /// Lists every key owned by `user_id`.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccessKey>, IamError>;
    /// Lists every key, for the expiry sweep.
    async fn list_all(&self) -> Result<Vec<AccessKey>, IamError>;
    /// Sets a key's activation status.
    async fn update_status(&self, access_key_id: &str, status: &str) -> Result<(), IamError>;
    /// Replaces a key's encrypted secret (rotation), stamping
    /// `last_rotated_at`.
    async fn rotate(&self, access_key_id: &str, new_encrypted_secret: &[u8]) -> Result<AccessKey, IamError>;
}

/// Postgres-backed [`AccessKeyStore`].
pub struct PgAccessKeyStore {
    store: Store,
}

impl PgAccessKeyStore {
    /// Wraps a connected [`Store`].
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, access_key_id, encrypted_secret, status, \
     created_at, updated_at, expires_at, last_rotated_at";

#[async_trait]
impl AccessKeyStore for PgAccessKeyStore {
    async fn create(
        &self,
        user_id: i64,
        access_key_id: &str,
        encrypted_secret: &[u8],
        expires_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<AccessKey, IamError> {
        let query = format!(
            "INSERT INTO access_keys (user_id, access_key_id, encrypted_secret, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {SELECT_COLUMNS}"
        );
        sqlx::query_as::<_, AccessKeyRow>(&query)
            .bind(user_id)
            .bind(access_key_id)
            .bind(encrypted_secret)
            .bind(expires_at)
            .fetch_one(self.store.pool())
            .await
            .map(Into::into)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    IamError::already_exists("access_key", access_key_id)
                } else {
                    IamError::internal("access_key_store.create", e.to_string())
                }
            })
    }

    async fn get_by_id(&self, id: i64) -> Result<AccessKey, IamError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM access_keys WHERE id = $1");
        sqlx::query_as::<_, AccessKeyRow>(&query)
            .bind(id)
            .fetch_optional(self.store.pool())
            .await
            .map_err(|e| IamError::internal("access_key_store.get_by_id", e.to_string()))?
            .map(Into::into)
            .ok_or_else(|| IamError::not_found("access_key", id.to_string()))
    }

    async fn get_by_access_key_id(&self, access_key_id: &str) -> Result<AccessKey, IamError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM access_keys WHERE access_key_id = $1");
        sqlx::query_as::<_, AccessKeyRow>(&query)
            .bind(access_key_id)
            .fetch_optional(self.store.pool())
            .await
            .map_err(|e| IamError::internal("access_key_store.get_by_access_key_id", e.to_string()))?
            .map(Into::into)
            .ok_or_else(|| IamError::not_found("access_key", access_key_id))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<AccessKey>, IamError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM access_keys WHERE user_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, AccessKeyRow>(&query)
            .bind(user_id)
            .fetch_all(self.store.pool())
            .await
            .map_err(|e| IamError::internal("access_key_store.list_by_user", e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all(&self) -> Result<Vec<AccessKey>, IamError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM access_keys ORDER BY id");
        let rows = sqlx::query_as::<_, AccessKeyRow>(&query)
            .fetch_all(self.store.pool())
            .await
            .map_err(|e| IamError::internal("access_key_store.list_all", e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_status(&self, access_key_id: &str, status: &str) -> Result<(), IamError> {
        let result = sqlx::query(
            "UPDATE access_keys SET status = $2, updated_at = now() WHERE access_key_id = $1",
        )
        .bind(access_key_id)
        .bind(status)
        .execute(self.store.pool())
        .await
        .map_err(|e| IamError::internal("access_key_store.update_status", e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(IamError::not_found("access_key", access_key_id));
        }
        Ok(())
    }

    async fn rotate(&self, access_key_id: &str, new_encrypted_secret: &[u8]) -> Result<AccessKey, IamError> {
        let query = format!(
            "UPDATE access_keys
             SET encrypted_secret = $2, updated_at = now(), last_rotated_at = now()
             WHERE access_key_id = $1
             RETURNING {SELECT_COLUMNS}"
        );
        sqlx::query_as::<_, AccessKeyRow>(&query)
            .bind(access_key_id)
            .bind(new_encrypted_secret)
            .fetch_optional(self.store.pool())
            .await
            .map_err(|e| IamError::internal("access_key_store.rotate", e.to_string()))?
            .map(Into::into)
            .ok_or_else(|| IamError::not_found("access_key", access_key_id))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
