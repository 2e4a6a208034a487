pub mod migrations;
pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::info;

use crate::models::MessageRecord;

/// Durable persistence capability for inbound messages.
///
/// The production implementation is [`PgStore`]; tests substitute fakes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create the message schema if it does not exist yet. Idempotent.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Insert one message and return the record the database created for it.
    /// The insert is a single statement, so it commits atomically.
    async fn insert(&self, content: &str) -> Result<MessageRecord, StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to database: {0}")]
    Connect(sqlx::Error),

    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Bounded connection pool settings.
///
/// Defaults: 7 connections, 30s checkout timeout, connections recycled after
/// 30 minutes. Checkout blocking past the timeout fails the acquiring query.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 7,
            acquire_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolConfig {
    pub fn new(max_connections: u32, acquire_timeout_secs: u64, max_lifetime_secs: u64) -> Self {
        Self {
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            max_lifetime: Duration::from_secs(max_lifetime_secs),
        }
    }

    /// Read pool settings from `COURIER_DB_*` environment variables, falling
    /// back to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_connections = std::env::var("COURIER_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_connections);

        let acquire_timeout_secs = std::env::var("COURIER_DB_ACQUIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.acquire_timeout.as_secs());

        let max_lifetime_secs = std::env::var("COURIER_DB_MAX_LIFETIME_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_lifetime.as_secs());

        Self::new(max_connections, acquire_timeout_secs, max_lifetime_secs)
    }
}

/// PostgreSQL-backed [`Store`] over a shared bounded pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Build the connection pool. Checkout beyond `acquire_timeout` fails the
    /// acquiring query rather than blocking forever.
    pub async fn connect(url: &str, config: PoolConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(url)
            .await
            .map_err(StoreError::Connect)?;

        info!(
            max_connections = config.max_connections,
            acquire_timeout_secs = config.acquire_timeout.as_secs(),
            "database pool created"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        migrations::run(&self.pool).await
    }

    async fn insert(&self, content: &str) -> Result<MessageRecord, StoreError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "INSERT INTO messages (content) VALUES ($1) RETURNING id, content, timestamp",
        )
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}
