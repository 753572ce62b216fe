//! Database row shapes and their conversion into the transport-agnostic
//! domain types from `iam_core::types`.
//!
//! Kept separate from `iam_core` so the core crate stays free of any
//! storage-backend dependency; only this crate knows about `sqlx::FromRow`.

use chrono::{DateTime, Utc};
use iam_core::types::{AccessKey, KeyStatus, Policy, User};

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct PolicyRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub policy_document: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PolicyRow> for Policy {
    fn from(row: PolicyRow) -> Self {
        Policy {
            id: row.id,
            name: row.name,
            description: row.description,
            policy_document: row.policy_document,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct AccessKeyRow {
    pub id: i64,
    pub user_id: i64,
    pub access_key_id: String,
    pub encrypted_secret: Vec<u8>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_rotated_at: Option<DateTime<Utc>>,
}

impl From<AccessKeyRow> for AccessKey {
    fn from(row: AccessKeyRow) -> Self {
        AccessKey {
            id: row.id,
            user_id: row.user_id,
            access_key_id: row.access_key_id,
            encrypted_secret: row.encrypted_secret,
            secret_access_key: None,
            status: KeyStatus::parse(&row.status).unwrap_or(KeyStatus::Active),
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            last_rotated_at: row.last_rotated_at,
            user_name: None,
        }
    }
}
