//! SQLite connection pool and schema

mod sqlite;

pub use sqlite::{create_pool, init_schema, CachePoolConfig, CachePoolError, SqlitePool};
