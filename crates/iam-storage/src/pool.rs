//! Postgres connection pool with background liveness monitoring.

use iam_core::IamError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::warn;

const MAX_CONNECTIONS: u32 = 25;
const MIN_IDLE_CONNECTIONS: u32 = 5;
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// A pooled Postgres connection plus a background health-ping task.
///
/// Pool sizing (25 max connections, 5 kept-idle connections, 5-minute
/// idle timeout, 30-minute max lifetime) and the 10-second health ping
/// are the documented defaults for this deployment.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connects to `dsn`, runs pending migrations, and spawns the
    /// background health-ping task.
    ///
    /// # Errors
    ///
    /// Returns `IamError::Internal` if the pool cannot be established or
    /// migrations fail.
    pub async fn connect(dsn: &str) -> Result<Self, IamError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .min_connections(MIN_IDLE_CONNECTIONS)
            .idle_timeout(IDLE_TIMEOUT)
            .max_lifetime(MAX_LIFETIME)
            .connect(dsn)
            .await
            .map_err(|e| IamError::internal("storage.connect", e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| IamError::internal("storage.migrate", e.to_string()))?;

        let store = Self { pool };
        store.spawn_health_monitor();
        Ok(store)
    }

    /// Returns the underlying pool for use by the store implementations.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool once with a 3-second timeout.
    ///
    /// # Errors
    ///
    /// Returns `IamError::Internal` if the ping fails or times out.
    pub async fn health_check(&self) -> Result<(), IamError> {
        tokio::time::timeout(HEALTH_CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map_err(|_| IamError::internal("storage.health_check", "timed out"))?
            .map_err(|e| IamError::internal("storage.health_check", e.to_string()))?;
        Ok(())
    }

    fn spawn_health_monitor(&self) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEALTH_CHECK_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(err) = store.health_check().await {
                    warn!(error = %err, "database connection unhealthy");
                }
            }
        });
    }

    /// Closes the pool, waiting for in-flight queries to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
