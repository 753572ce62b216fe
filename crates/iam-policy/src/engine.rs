//! The policy evaluation engine: first-match-wins, default-deny.

use crate::cache::DecisionCache;
use crate::matching::{match_action, match_resource};
use async_trait::async_trait;
use iam_core::types::PolicyDocumentBody;
use iam_core::IamError;

/// The narrow capability the engine needs from the user service: the set
/// of policies bound to a user. Breaks the cycle a direct dependency on
/// the user service would create.
#[async_trait]
pub trait PolicyLookup: Send + Sync {
    /// Returns every policy bound to `user_id`, in an implementation-defined
    /// but stable order.
    async fn policies_for_user(&self, user_id: i64) -> Result<Vec<iam_core::types::Policy>, IamError>;
}

/// Evaluates whether a user may perform `action` on `resource`.
pub struct PolicyEngine<L: PolicyLookup> {
    lookup: L,
    cache: DecisionCache,
}

impl<L: PolicyLookup> std::fmt::Debug for PolicyEngine<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine").field("cache", &self.cache).finish_non_exhaustive()
    }
}

impl<L: PolicyLookup> PolicyEngine<L> {
    /// Creates a new engine over `lookup`, with its own decision cache and
    /// background sweep task.
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            cache: DecisionCache::new(),
        }
    }

    /// Evaluates whether `user_id` may perform `action` on `resource`.
    ///
    /// Checks the decision cache first. On a miss, loads the user's bound
    /// policies, evaluates each document's statements in order, and
    /// returns the effect of the first matching statement across all
    /// policies. No statement matching anywhere is a default deny.
    ///
    /// # Errors
    ///
    /// Returns `IamError::FailedPrecondition` if a bound policy's document
    /// fails to parse, or whatever error `PolicyLookup` surfaces.
    pub async fn evaluate(&self, user_id: i64, action: &str, resource: &str) -> Result<bool, IamError> {
        if let Some(cached) = self.cache.get(user_id, action, resource).await {
            return Ok(cached);
        }

        let policies = self.lookup.policies_for_user(user_id).await?;

        let mut decision = false;
        for policy in &policies {
            let doc: PolicyDocumentBody = serde_json::from_str(&policy.policy_document)
                .map_err(|_| IamError::failed_precondition("invalid policy document format"))?;

            if let Some(effect_allows) = Self::evaluate_document(&doc, action, resource) {
                decision = effect_allows;
                self.cache.put(user_id, action, resource, decision).await;
                return Ok(decision);
            }
        }

        self.cache.put(user_id, action, resource, decision).await;
        Ok(decision)
    }

    /// Evaluates a single parsed document's statements in order, returning
    /// `Some(effect_allows)` on the first matching statement, `None` if
    /// none match.
    fn evaluate_document(doc: &PolicyDocumentBody, action: &str, resource: &str) -> Option<bool> {
        for statement in &doc.statement {
            if !match_resource(&statement.resource, resource) {
                continue;
            }
            if !match_action(&statement.action, action) {
                continue;
            }
            return Some(statement.effect == iam_core::types::Effect::Allow);
        }
        None
    }

    /// Clears the decision cache wholesale. Call after any policy
    /// mutation or user-to-policy binding change.
    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_core::types::Policy;
    use std::sync::Mutex;

    struct FakeLookup {
        policies: Mutex<Vec<Policy>>,
    }

    fn make_policy(id: i64, document: &str) -> Policy {
        Policy {
            id,
            name: format!("policy-{id}"),
            description: String::new(),
            policy_document: document.to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[async_trait]
    impl PolicyLookup for FakeLookup {
        async fn policies_for_user(&self, _user_id: i64) -> Result<Vec<Policy>, IamError> {
            Ok(self.policies.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn test_allow_statement_grants_permission() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![make_policy(
                1,
                r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
            )]),
        };
        let engine = PolicyEngine::new(lookup);
        let allowed = engine
            .evaluate(1, "ecs:StartInstance", "acs:ecs:cn:1:instance/i")
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_default_deny_when_nothing_matches() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![make_policy(
                1,
                r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
            )]),
        };
        let engine = PolicyEngine::new(lookup);
        let allowed = engine
            .evaluate(1, "s3:GetObject", "acs:s3:::bucket/key")
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_default_deny_with_no_policies() {
        let lookup = FakeLookup { policies: Mutex::new(vec![]) };
        let engine = PolicyEngine::new(lookup);
        let allowed = engine.evaluate(1, "ecs:StartInstance", "*").await.unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_first_match_wins_across_policies() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![
                make_policy(
                    1,
                    r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
                ),
                make_policy(
                    2,
                    r#"{"version":"2024-01-01","statement":[{"effect":"Deny","action":["ecs:*"],"resource":["*"]}]}"#,
                ),
            ]),
        };
        let engine = PolicyEngine::new(lookup);
        let allowed = engine
            .evaluate(1, "ecs:StartInstance", "acs:ecs:cn:1:instance/i")
            .await
            .unwrap();
        assert!(allowed, "first statement (Allow) must win over the second (Deny)");
    }

    #[tokio::test]
    async fn test_first_match_wins_within_one_policy_ordered_statements() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![make_policy(
                1,
                r#"{"version":"2024-01-01","statement":[
                    {"effect":"Deny","action":["ecs:*"],"resource":["*"]},
                    {"effect":"Allow","action":["ecs:*"],"resource":["*"]}
                ]}"#,
            )]),
        };
        let engine = PolicyEngine::new(lookup);
        let allowed = engine
            .evaluate(1, "ecs:StartInstance", "acs:ecs:cn:1:instance/i")
            .await
            .unwrap();
        assert!(!allowed, "the earlier Deny statement must win");
    }

    #[tokio::test]
    async fn test_malformed_policy_document_is_an_error() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![make_policy(1, "not json")]),
        };
        let engine = PolicyEngine::new(lookup);
        let result = engine.evaluate(1, "ecs:StartInstance", "*").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_decision_is_cached_across_calls() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![make_policy(
                1,
                r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
            )]),
        };
        let engine = PolicyEngine::new(lookup);
        let first = engine.evaluate(1, "ecs:StartInstance", "*").await.unwrap();

        // Remove every policy; a cached decision must still be honored.
        engine.lookup.policies.lock().unwrap().clear();
        let second = engine.evaluate(1, "ecs:StartInstance", "*").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let lookup = FakeLookup {
            policies: Mutex::new(vec![make_policy(
                1,
                r#"{"version":"2024-01-01","statement":[{"effect":"Allow","action":["ecs:*"],"resource":["*"]}]}"#,
            )]),
        };
        let engine = PolicyEngine::new(lookup);
        assert!(engine.evaluate(1, "ecs:StartInstance", "*").await.unwrap());

        engine.lookup.policies.lock().unwrap().clear();
        engine.invalidate().await;

        assert!(!engine.evaluate(1, "ecs:StartInstance", "*").await.unwrap());
    }
}
