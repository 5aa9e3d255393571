//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file, if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Local cache database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// SQLite URL, e.g. `sqlite://reviews.db` or `sqlite::memory:`
    #[serde(default = "default_cache_url")]
    pub url: String,
    #[serde(default = "default_cache_max_connections")]
    pub max_connections: u32,
}

impl CacheConfig {
    /// Check if the cache lives only in memory
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Remote synchronization settings
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Timeout applied to every remote round-trip
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
    /// Age after which a vendor's cached reviews are re-pulled
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Length of the rolling statistics window
    #[serde(default = "default_stats_window_days")]
    pub stats_window_days: u32,
}

impl SyncConfig {
    #[must_use]
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    #[must_use]
    pub fn stale_after(&self) -> chrono::Duration {
        let secs = i64::try_from(self.stale_after_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        chrono::Duration::seconds(secs)
    }

    #[must_use]
    pub fn stats_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.stats_window_days))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_timeout_ms: default_remote_timeout_ms(),
            stale_after_secs: default_stale_after_secs(),
            stats_window_days: default_stats_window_days(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_cache_url(),
            max_connections: default_cache_max_connections(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "vendor-reviews".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_cache_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_cache_max_connections() -> u32 {
    4
}

fn default_remote_timeout_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_stale_after_secs() -> u64 {
    300 // 5 minutes
}

fn default_stats_window_days() -> u32 {
    30
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            cache: CacheConfig {
                url: lookup("REVIEW_CACHE_URL").unwrap_or_else(default_cache_url),
                max_connections: parse_var(
                    &lookup,
                    "REVIEW_CACHE_MAX_CONNECTIONS",
                    default_cache_max_connections,
                )?,
            },
            sync: SyncConfig {
                remote_timeout_ms: parse_var(&lookup, "REMOTE_TIMEOUT_MS", default_remote_timeout_ms)?,
                stale_after_secs: parse_var(&lookup, "SYNC_STALE_AFTER_SECS", default_stale_after_secs)?,
                stats_window_days: parse_var(&lookup, "STATS_WINDOW_DAYS", default_stats_window_days)?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
