//! Async-safe connection pool for Diesel PostgreSQL connections.
//!
//! Wraps `diesel-async` and `bb8`. Startup goes through [`DbPool::connect`],
//! which proves a live connection within the configured timeout so the
//! process never starts serving against an unreachable store. Shutdown goes
//! through [`DbPool::close`], which waits (bounded) for checked-out
//! connections to come back before the pool is dropped.

use std::time::Duration;

use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tokio::time::{Instant, sleep, timeout};
use tracing::{info, warn};

const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors that can occur during pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Failed to check out a connection from the pool.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// Failed to build the pool or reach the database at startup.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Create a checkout error with the given message.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Create a build error with the given message.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Configuration for the database connection pool.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use slot_service::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://localhost/slots")
///     .with_max_size(4)
///     .with_connection_timeout(Duration::from_secs(5));
/// assert_eq!(config.database_url(), "postgres://localhost/slots");
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Create a new configuration with the given database URL.
    ///
    /// Defaults: 10 connections, 1 kept idle, 10 second connect timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: Some(1),
            connection_timeout: Duration::from_secs(10),
        }
    }

    /// Set the maximum number of connections in the pool.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the minimum number of idle connections to maintain.
    #[must_use]
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Bound for both startup connection and per-checkout waits.
    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Get the connection timeout.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

/// Async connection pool for PostgreSQL via Diesel.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and prove the database answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` when the pool cannot be built, the probe
    /// query fails, or both together exceed the connection timeout.
    pub async fn connect(config: PoolConfig) -> Result<Self, PoolError> {
        let limit = config.connection_timeout;
        let attempt = async move {
            let pool = Self::new(config).await?;
            pool.ping().await?;
            Ok::<_, PoolError>(pool)
        };
        timeout(limit, attempt).await.map_err(|_| {
            PoolError::build(format!(
                "database did not answer within {}s",
                limit.as_secs()
            ))
        })?
    }

    /// Build the pool without probing it.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Build` if the pool cannot be constructed.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner: pool })
    }

    /// Get a connection from the pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::Checkout` if a connection cannot be obtained within
    /// the configured timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    async fn ping(&self) -> Result<(), PoolError> {
        let mut conn = self
            .get()
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| PoolError::build(err.to_string()))
    }

    fn in_use(&self) -> u32 {
        let state = self.inner.state();
        state.connections.saturating_sub(state.idle_connections)
    }

    /// Release the pool, waiting up to `grace` for borrowed connections.
    ///
    /// Best effort: a timeout is logged and the pool is dropped anyway.
    pub async fn close(self, grace: Duration) {
        let deadline = Instant::now() + grace;
        while self.in_use() > 0 && Instant::now() < deadline {
            sleep(CLOSE_POLL_INTERVAL).await;
        }
        let in_use = self.in_use();
        if in_use > 0 {
            warn!(in_use, "closing database pool with connections still checked out");
        } else {
            info!("database pool closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_config_default_values() {
        let config = PoolConfig::new("postgres://localhost/test");

        assert_eq!(config.database_url(), "postgres://localhost/test");
        assert_eq!(config.max_size, 10);
        assert_eq!(config.min_idle, Some(1));
        assert_eq!(config.connection_timeout(), Duration::from_secs(10));
    }

    #[rstest]
    fn pool_config_builder_pattern() {
        let config = PoolConfig::new("postgres://localhost/test")
            .with_max_size(20)
            .with_min_idle(None)
            .with_connection_timeout(Duration::from_secs(3));

        assert_eq!(config.max_size, 20);
        assert_eq!(config.min_idle, None);
        assert_eq!(config.connection_timeout(), Duration::from_secs(3));
    }

    #[rstest]
    fn pool_error_display() {
        let checkout_err = PoolError::checkout("connection refused");
        let build_err = PoolError::build("invalid URL");

        assert!(checkout_err.to_string().contains("connection refused"));
        assert!(build_err.to_string().contains("invalid URL"));
    }

    #[rstest]
    #[tokio::test]
    async fn connect_fails_for_unreachable_database() {
        let config = PoolConfig::new("postgres://slots@127.0.0.1:1/slots")
            .with_connection_timeout(Duration::from_millis(500));
        let result = DbPool::connect(config).await;
        assert!(matches!(result, Err(PoolError::Build { .. })));
    }
}
