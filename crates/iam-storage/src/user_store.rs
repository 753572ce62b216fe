//! User storage: CRUD plus the user-to-policy binding table.
//!
//! `AttachPolicy`/`DetachPolicy`/`ListPolicies` live on the user store
//! rather than the policy store, since the binding table belongs to
//! neither resource alone and the user is the side that queries it.

use crate::pool::Store;
use crate::rows::{PolicyRow, UserRow};
use async_trait::async_trait;
use iam_core::types::{Policy, User};
use iam_core::IamError;

/// The user storage contract. Any backend satisfying this trait (SQL, an
/// in-memory fake for tests) is acceptable; there is no subclassing.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user, returning it with its assigned id and
    /// timestamps.
    async fn create(&self, name: &str, display_name: &str, email: &str) -> Result<User, IamError>;
    /// Fetches a user by surrogate id.
    async fn get_by_id(&self, id: i64) -> Result<User, IamError>;
    /// Fetches a user by its unique name.
    async fn get_by_name(&self, name: &str) -> Result<User, IamError>;
    /// Fetches a user by its unique email.
    async fn get_by_email(&self, email: &str) -> Result<User, IamError>;
    /// Lists every user.
    async fn list(&self) -> Result<Vec<User>, IamError>;
    /// Updates the mutable fields (`display_name`, `email`) of a user.
    async fn update(&self, id: i64, display_name: &str, email: &str) -> Result<User, IamError>;
    /// Deletes a user by id.
    async fn delete(&self, id: i64) -> Result<(), IamError>;
    /// Binds `policy_id` to `user_id`. Idempotent at the business level;
    /// surfaces `IamError::AlreadyExists` on a duplicate binding so the
    /// service layer may choose to swallow it.
    async fn attach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError>;
    /// Removes a user-to-policy binding.
    async fn detach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError>;
    /// Lists the policies bound to `user_id`, via a join on the binding
    /// table.
    async fn list_policies(&self, user_id: i64) -> Result<Vec<Policy>, IamError>;
}

/// Postgres-backed [`UserStore`].
pub struct PgUserStore {
    store: Store,
}

impl PgUserStore {
    /// Wraps a connected [`Store`].
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, name: &str, display_name: &str, email: &str) -> Result<User, IamError> {
        sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (name, display_name, email) VALUES ($1, $2, $3)
             RETURNING id, name, display_name, email, created_at, updated_at",
        )
        .bind(name)
        .bind(display_name)
        .bind(email)
        .fetch_one(self.store.pool())
        .await
        .map(Into::into)
        .map_err(|e| map_insert_error(e, "user", name))
    }

    async fn get_by_id(&self, id: i64) -> Result<User, IamError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, display_name, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("user_store.get_by_id", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("user", id.to_string()))
    }

    async fn get_by_name(&self, name: &str) -> Result<User, IamError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, display_name, email, created_at, updated_at FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("user_store.get_by_name", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("user", name))
    }

    async fn get_by_email(&self, email: &str) -> Result<User, IamError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, display_name, email, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("user_store.get_by_email", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("user", email))
    }

    async fn list(&self) -> Result<Vec<User>, IamError> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, display_name, email, created_at, updated_at FROM users ORDER BY id",
        )
        .fetch_all(self.store.pool())
        .await
        .map_err(|e| IamError::internal("user_store.list", e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: i64, display_name: &str, email: &str) -> Result<User, IamError> {
        sqlx::query_as::<_, UserRow>(
            "UPDATE users SET display_name = $2, email = $3, updated_at = now()
             WHERE id = $1
             RETURNING id, name, display_name, email, created_at, updated_at",
        )
        .bind(id)
        .bind(display_name)
        .bind(email)
        .fetch_optional(self.store.pool())
        .await
        .map_err(|e| IamError::internal("user_store.update", e.to_string()))?
        .map(Into::into)
        .ok_or_else(|| IamError::not_found("user", id.to_string()))
    }

    async fn delete(&self, id: i64) -> Result<(), IamError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.store.pool())
            .await
            .map_err(|e| IamError::internal("user_store.delete", e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(IamError::not_found("user", id.to_string()));
        }
        Ok(())
    }

    async fn attach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError> {
        sqlx::query("INSERT INTO user_policies (user_id, policy_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(policy_id)
            .execute(self.store.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    IamError::already_exists(
                        "user_policy_binding",
                        format!("{user_id}:{policy_id}"),
                    )
                } else {
                    IamError::internal("user_store.attach_policy", e.to_string())
                }
            })?;
        Ok(())
    }

    async fn detach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError> {
        sqlx::query("DELETE FROM user_policies WHERE user_id = $1 AND policy_id = $2")
            .bind(user_id)
            .bind(policy_id)
            .execute(self.store.pool())
            .await
            .map_err(|e| IamError::internal("user_store.detach_policy", e.to_string()))?;
        Ok(())
    }

    async fn list_policies(&self, user_id: i64) -> Result<Vec<Policy>, IamError> {
        let rows = sqlx::query_as::<_, PolicyRow>(
            "SELECT p.id, p.name, p.description, p.policy_document, p.created_at, p.updated_at
             FROM policies p
             JOIN user_policies up ON p.id = up.policy_id
             WHERE up.user_id = $1
             ORDER BY p.id",
        )
        .bind(user_id)
        .fetch_all(self.store.pool())
        .await
        .map_err(|e| IamError::internal("user_store.list_policies", e.to_string()))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn map_insert_error(err: sqlx::Error, entity: &str, key: &str) -> IamError {
    if is_unique_violation(&err) {
        IamError::already_exists(entity, key)
    } else {
        IamError::internal("user_store.create", err.to_string())
    }
}
