//! Policy service: creation and update of declarative policy documents.

use iam_core::types::Policy;
use iam_core::validation::validate_policy_document;
use iam_core::IamError;
use iam_storage::PolicyStore;
use std::sync::Arc;

/// Manages policy documents.
pub struct PolicyService {
    policies: Arc<dyn PolicyStore>,
}

impl PolicyService {
    /// Wires the service against its store.
    pub fn new(policies: Arc<dyn PolicyStore>) -> Self {
        Self { policies }
    }

    /// Creates a new policy after shallow admission-time validation of
    /// `policy_document`.
    ///
    /// # Errors
    ///
    /// Returns `IamError::InvalidArgument` if the document is missing the
    /// `"Statement"` or `"Allow"`/`"Deny"` literals, or
    /// `IamError::AlreadyExists` if `name` collides with an existing
    /// policy.
    pub async fn create(&self, name: &str, description: &str, policy_document: &str) -> Result<Policy, IamError> {
        if !validate_policy_document(policy_document) {
            return Err(IamError::invalid_argument(
                "policy_document",
                "must contain \"Statement\" and either \"Allow\" or \"Deny\"",
            ));
        }
        self.policies.create(name, description, policy_document).await
    }

    /// Updates a policy's `description` and `policy_document`.
    ///
    /// # Errors
    ///
    /// Returns `IamError::InvalidArgument` if the document fails
    /// admission validation, or `IamError::NotFound` if `id` does not
    /// exist.
    pub async fn update(&self, id: i64, description: &str, policy_document: &str) -> Result<Policy, IamError> {
        if !validate_policy_document(policy_document) {
            return Err(IamError::invalid_argument(
                "policy_document",
                "must contain \"Statement\" and either \"Allow\" or \"Deny\"",
            ));
        }
        self.policies.update(id, description, policy_document).await
    }
}
