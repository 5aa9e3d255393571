//! SQLite connection pool management

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub use sqlx::SqlitePool;

/// Errors raised while opening or preparing the cache database
#[derive(Debug, thiserror::Error)]
pub enum CachePoolError {
    #[error("Invalid cache URL {0}: {1}")]
    InvalidUrl(String, String),

    #[error("Cache database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Cache database configuration
#[derive(Debug, Clone)]
pub struct CachePoolConfig {
    /// SQLite URL (`sqlite://path/to/reviews.db` or `sqlite::memory:`)
    pub url: String,
    /// Maximum number of connections in the pool (forced to 1 in memory)
    pub max_connections: u32,
    /// How long a writer waits on a locked database
    pub busy_timeout: Duration,
}

impl Default for CachePoolConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://reviews.db".to_string(),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&review_common::CacheConfig> for CachePoolConfig {
    fn from(config: &review_common::CacheConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            ..Default::default()
        }
    }
}

impl CachePoolConfig {
    /// Private in-memory database, gone when the pool is dropped
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Default::default()
        }
    }

    /// Check if the database lives only in memory
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Create a new SQLite connection pool
///
/// File databases run in WAL mode so cache reads are not blocked by an
/// in-flight snapshot replacement. An in-memory database exists per
/// connection, so its pool holds exactly one connection that never expires.
pub async fn create_pool(config: &CachePoolConfig) -> Result<SqlitePool, CachePoolError> {
    // from_str treats any other scheme as a file name
    if !config.url.starts_with("sqlite:") {
        return Err(CachePoolError::InvalidUrl(
            config.url.clone(),
            "expected a sqlite: URL".to_string(),
        ));
    }

    let mut options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| CachePoolError::InvalidUrl(config.url.clone(), e.to_string()))?
        .create_if_missing(true)
        .busy_timeout(config.busy_timeout);

    let pool_options = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;

    tracing::info!(
        url = %config.url,
        in_memory = config.is_in_memory(),
        "Review cache pool created"
    );

    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        vendor_id TEXT NOT NULL,
        review_id TEXT NOT NULL,
        customer_id TEXT NOT NULL,
        customer_name TEXT NOT NULL,
        rating REAL NOT NULL,
        star INTEGER NOT NULL,
        text TEXT NOT NULL,
        search_text TEXT NOT NULL DEFAULT '',
        image_urls TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL,
        is_verified_purchase INTEGER NOT NULL DEFAULT 0,
        is_anonymous INTEGER NOT NULL DEFAULT 0,
        helpful_count INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        flagged INTEGER NOT NULL DEFAULT 0,
        flag_reason TEXT,
        flagged_at INTEGER,
        reply_vendor_id TEXT,
        reply_vendor_name TEXT,
        reply_text TEXT,
        reply_created_at INTEGER,
        reply_edited_at INTEGER,
        reply_status TEXT,
        last_synced_at INTEGER,
        PRIMARY KEY (vendor_id, review_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_reviews_vendor_created
        ON reviews (vendor_id, created_at DESC)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vendor_aggregates (
        vendor_id TEXT PRIMARY KEY,
        total_reviews INTEGER NOT NULL,
        star_1 INTEGER NOT NULL,
        star_2 INTEGER NOT NULL,
        star_3 INTEGER NOT NULL,
        star_4 INTEGER NOT NULL,
        star_5 INTEGER NOT NULL,
        average_rating REAL NOT NULL,
        thirty_day_count INTEGER NOT NULL,
        thirty_day_average REAL NOT NULL,
        last_updated INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS vendor_sync_state (
        vendor_id TEXT PRIMARY KEY,
        last_pulled_at INTEGER NOT NULL
    )
    "#,
];

/// Create the cache tables if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> Result<(), CachePoolError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
