//! Policy document storage: CRUD by id and unique name.

use crate::pool::Store;
use crate::rows::PolicyRow;
use async_trait::async_trait;
use iam_core::types::Policy;
use iam_core::IamError;

/// The policy storage contract.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Inserts a new policy.
    async fn create(&self, name: &str, description: &str, policy_document: &str) -> Result<Policy, IamError>;
    /// Fetches a policy by surrogate id.
    async fn get_by_id(&self, id: i64) -> Result<Policy, IamError>;
    /// Fetches a policy by its unique name.
    async fn get_by_name(&self, name: &str) -> Result<Policy, IamError>;
    /// Lists every policy.
    async fn list(&self) -> Result<Vec<Policy>, IamError>;
    /// Updates a policy's `description` and `policy_document`. `name` is
    /// immutable after creation.
    async fn update(&self, id: i64, description: &str, policy_document: &str) -> Result<Policy, IamError>;
    /// Deletes a policy by id.
    async fn delete(&self, id: i64) -> Result<(), IamError>;
}

/// Postgres-backed [`PolicyStore`].
pub struct PgPolicyStore {
    store: Store,
}

impl PgPolicyStore {
    /// Wraps a connected [`Store`].
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn create(&self, name: &str, description: &str, policy_document: &str) -> Result<Policy, IamError> {
        sqlx::query_as::<_, PolicyRow>(
            "INSERT INTO policies (name, description, policy_document) VALUES ($1, $2, $3)
             RETURNING id, name, description, policy_document, created_at, updated_at",
        )
        .bind(name)
        .bind(description)
        .bind(policy_document)
        .fetch_one(self.store.pool())
        .await
        .map(Into::into)
        .map_err(|e| {
            if is_unique_violation(&e) {
                IamError::already_exists("policy", name)
            } else {
                IamError::internal("policy_store.create", e.to_string())
            }
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Policy, IamError> {
        sqlx::query_as::<_, PolicyRow>(
            "SELECT id, name, description, policy_document, created_at, updated_at
             FROM policies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("policy_store.get_by_id", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("policy", id.to_string()))
    }

    async fn get_by_name(&self, name: &str) -> Result<Policy, IamError> {
        sqlx::query_as::<_, PolicyRow>(
            "SELECT id, name, description, policy_document, created_at, updated_at
             FROM policies WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("policy_store.get_by_name", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("policy", name))
    }

    async fn list(&self) -> Result<Vec<Policy>, IamError> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            "SELECT id, name, description, policy_document, created_at, updated_at
             FROM policies ORDER BY id",
        )
        .fetch_all(self.store.pool())
        .await
        .map_err(|e| IamError::internal("policy_store.list", e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: i64, description: &str, policy_document: &str) -> Result<Policy, IamError> {
        sqlx::query_as::<_, PolicyRow>(
            "UPDATE policies SET description = $2, policy_document = $3, updated_at = now()
             WHERE id = $1
             RETURNING id, name, description, policy_document, created_at, updated_at",
        )
        .bind(id)
        .bind(description)
        .bind(policy_document)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("policy_store.update", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("policy", id.to_string()))
    }

    async fn delete(&self, id: i64) -> Result<(), IamError> {
        let result = sqlx::query("DELETE FROM policies WHERE id = $1")
            .bind(id)
            .execute(self.store.pool())
            .await
            .map_err(|e| IamError::internal("policy_store.delete", e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(IamError::not_found("policy", id.to_string()));
        }
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
