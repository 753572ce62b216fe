//! Core domain types for the IAM service.
//!
//! These types are shared across every crate in the workspace: stores
//! persist them, services operate on them, the policy engine evaluates
//! them, and the gateway serializes them over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered principal. The identifier is an immutable surrogate key;
/// `name` and `email` are unique; `display_name` is the only freely mutable
/// field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Surrogate identifier, immutable once assigned.
    pub id: i64,
    /// Unique name, 3-32 chars, `[A-Za-z0-9_-]`.
    pub name: String,
    /// Mutable display name.
    pub display_name: String,
    /// Unique email address.
    pub email: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// An authorization policy: a name, description, and an opaque JSON
/// document. The document is not parsed at this layer; [`PolicyDocument`]
/// is parsed lazily by the policy engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    /// Surrogate identifier.
    pub id: i64,
    /// Unique policy name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Raw JSON policy document.
    pub policy_document: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// The effect of a statement. Serializes as `"Allow"`/`"Deny"`; also
/// accepts the lowercase spelling on the way in, since admission
/// (`validate_policy_document`) is case-insensitive and must not reject a
/// document the engine can't then parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum Effect {
    /// Grants the action.
    #[serde(alias = "allow")]
    Allow,
    /// Denies the action.
    #[serde(alias = "deny")]
    Deny,
}

/// A single statement within a [`PolicyDocumentBody`]: an effect paired
/// with the action and resource patterns it applies to.
///
/// Field names deserialize case-insensitively between the lowercase shape
/// this workspace writes (`effect`/`action`/`resource`) and the
/// capitalized, AWS-IAM-shaped variant (`Effect`/`Action`/`Resource`) via
/// `serde(alias)` — the admission check in
/// [`crate::validation::validate_policy_document`] accepts either, so the
/// engine's parse must accept whichever one it admitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    /// Allow or Deny.
    #[serde(alias = "Effect")]
    pub effect: Effect,
    /// Action patterns, e.g. `["ecs:*"]`.
    #[serde(alias = "Action")]
    pub action: Vec<String>,
    /// Resource patterns, e.g. `["acs:ecs:*:*:instance/*"]`.
    #[serde(alias = "Resource")]
    pub resource: Vec<String>,
}

/// The parsed shape of a policy document: `{version, statement: [...]}`.
///
/// Admission-time validation (in [`crate::validation::validate_policy_document`])
/// is intentionally shallow and case-insensitive: it checks for the
/// literal `statement` key and either `allow` or `deny` as an effect
/// value. This type is the fuller structural parse the policy engine
/// performs at evaluation time, and rejects malformed documents with a
/// structural error; its fields alias the capitalized spelling so a
/// document admitted under either casing always parses here too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyDocumentBody {
    /// Document format version.
    #[serde(alias = "Version")]
    pub version: String,
    /// Statements, evaluated in document order.
    #[serde(alias = "Statement")]
    pub statement: Vec<Statement>,
}

/// Access key activation state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// The key may authenticate requests.
    Active,
    /// The key is authenticated but requests are rejected with
    /// `PermissionDenied`.
    Inactive,
}

impl KeyStatus {
    /// Parses a status string as accepted by `UpdateAccessKeyStatus`.
    ///
    /// # Errors
    ///
    /// Returns `None` if `s` is neither `"active"` nor `"inactive"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Renders the status as the wire string used in storage and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// A long-lived access key pair.
///
/// `secret_access_key` is populated only by `create`/`rotate`; every other
/// read path leaves it `None`. `encrypted_secret` is the only form of the
/// secret ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessKey {
    /// Surrogate identifier.
    pub id: i64,
    /// The owning user's id.
    pub user_id: i64,
    /// Public identifier, 20 chars, URL-safe base64-derived.
    pub access_key_id: String,
    /// Nonce-prefixed AES-256-GCM ciphertext of the secret. Never exposed
    /// outside the storage layer.
    #[serde(skip_serializing)]
    pub encrypted_secret: Vec<u8>,
    /// Plaintext secret, present only immediately after create/rotate.
    pub secret_access_key: Option<String>,
    /// Active or inactive.
    pub status: KeyStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Expiry, defaulting to `created_at + 90d`.
    pub expires_at: Option<DateTime<Utc>>,
    /// Timestamp of the most recent rotation, if any.
    pub last_rotated_at: Option<DateTime<Utc>>,
    /// Owning user's name, populated only by join reads
    /// (`CredentialService::get`), never persisted.
    pub user_name: Option<String>,
}

/// The transient signature envelope carried in request metadata. Never
/// stored; reconstructed per request by the auth interceptor.
#[derive(Debug, Clone)]
pub struct SignatureEnvelope {
    /// Public access key identifier.
    pub access_key_id: String,
    /// Base64 HMAC signature.
    pub signature: String,
    /// Timestamp in `YYYYMMDDTHHMMSSZ` format.
    pub timestamp: String,
    /// Canonical request bytes that were signed.
    pub request_data: String,
}
