//! User service: creation, lookup, and policy binding.

use iam_core::types::{Policy, User};
use iam_core::validation::{validate_email, validate_user_name};
use iam_core::IamError;
use iam_storage::UserStore;
use std::sync::Arc;

/// Manages user records and their policy bindings.
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    /// Wires the service against its store.
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Creates a new user after validating `name` and `email`.
    ///
    /// # Errors
    ///
    /// Returns `IamError::InvalidArgument` if either fails validation, or
    /// `IamError::AlreadyExists` if `name`/`email` collide with an
    /// existing user.
    pub async fn create_user(&self, name: &str, display_name: &str, email: &str) -> Result<User, IamError> {
        if !validate_user_name(name) {
            return Err(IamError::invalid_argument("name", "must be 3-32 chars of [A-Za-z0-9_-]"));
        }
        if !validate_email(email) {
            return Err(IamError::invalid_argument("email", "not a valid email address"));
        }
        self.users.create(name, display_name, email).await
    }

    /// Fetches a user by its unique name.
    pub async fn get_user(&self, name: &str) -> Result<User, IamError> {
        self.users.get_by_name(name).await
    }

    /// Binds `policy_id` to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `IamError::AlreadyExists` if the binding already exists.
    pub async fn attach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError> {
        self.users.attach_policy(user_id, policy_id).await
    }

    /// Removes a user-to-policy binding.
    pub async fn detach_policy(&self, user_id: i64, policy_id: i64) -> Result<(), IamError> {
        self.users.detach_policy(user_id, policy_id).await
    }

    /// Lists the policies bound to `user_id`.
    pub async fn list_user_policies(&self, user_id: i64) -> Result<Vec<Policy>, IamError> {
        self.users.list_policies(user_id).await
    }
}

/// Bridges [`UserStore::list_policies`] to the narrow [`iam_policy::PolicyLookup`]
/// capability the policy engine needs, breaking the cycle a direct
/// dependency on `UserService` would create.
pub struct StorePolicyLookup {
    users: Arc<dyn UserStore>,
}

impl StorePolicyLookup {
    /// Wraps a user store as a [`iam_policy::PolicyLookup`].
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl iam_policy::PolicyLookup for StorePolicyLookup {
    async fn policies_for_user(&self, user_id: i64) -> Result<Vec<Policy>, IamError> {
        self.users.list_policies(user_id).await
    }
}
