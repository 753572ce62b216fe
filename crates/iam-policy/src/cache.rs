//! In-process decision cache, keyed on `(user_id, action, resource)`.
//!
//! Modeled purely in-memory per the evaluation procedure this crate
//! implements: no Redis-backed entry here, only the reader/writer TTL
//! discipline a distributed cache would also need.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const TTL: Duration = Duration::from_secs(5 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Copy)]
struct CacheEntry {
    allowed: bool,
    expires_at: Instant,
}

type CacheKey = (i64, String, String);

/// A cloneable handle to the shared decision cache.
#[derive(Clone)]
pub struct DecisionCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl DecisionCache {
    /// Creates an empty cache and spawns its background sweep task.
    pub fn new() -> Self {
        let cache = Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        };
        cache.spawn_sweeper();
        cache
    }

    fn spawn_sweeper(&self) {
        let entries = self.entries.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let now = Instant::now();
                let mut guard = entries.write().await;
                guard.retain(|_, entry| entry.expires_at > now);
            }
        });
    }

    /// Returns the cached decision for `(user_id, action, resource)`, if
    /// present and unexpired.
    pub async fn get(&self, user_id: i64, action: &str, resource: &str) -> Option<bool> {
        let key = (user_id, action.to_string(), resource.to_string());
        let guard = self.entries.read().await;
        guard.get(&key).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.allowed)
            } else {
                None
            }
        })
    }

    /// Inserts a decision with a fresh 5-minute TTL.
    pub async fn put(&self, user_id: i64, action: &str, resource: &str, allowed: bool) {
        let key = (user_id, action.to_string(), resource.to_string());
        let entry = CacheEntry {
            allowed,
            expires_at: Instant::now() + TTL,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Clears the entire cache. Called on any policy mutation or
    /// user-to-policy binding change; coarse invalidation is permitted.
    pub async fn invalidate(&self) {
        self.entries.write().await.clear();
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DecisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCache").finish_non_exhaustive()
    }
}
