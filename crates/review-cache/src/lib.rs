//! # review-cache
//!
//! Embedded SQLite implementation of the `LocalReviewCache` port.
//!
//! ## Overview
//!
//! This crate keeps a denormalized, read-optimized copy of each vendor's
//! reviews and aggregate so listings and statistics can be served offline.
//! It handles:
//!
//! - Connection pool management and schema setup
//! - Row models with SQLx `FromRow` derives
//! - Row ↔ entity mappers
//! - The cache store itself
//!
//! ## Usage
//!
//! ```rust,ignore
//! use review_cache::{CachePoolConfig, SqliteReviewCache};
//! use review_core::traits::{LocalReviewCache, ReviewFilter};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = SqliteReviewCache::connect(&CachePoolConfig::in_memory()).await?;
//!     let reviews = cache.list_active(&vendor_id, &ReviewFilter::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, init_schema, CachePoolConfig, CachePoolError, SqlitePool};
pub use repositories::SqliteReviewCache;
