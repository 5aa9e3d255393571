//! Aggregate and sync-state database models

use sqlx::FromRow;

/// Database model for the vendor_aggregates table
#[derive(Debug, Clone, FromRow)]
pub struct AggregateModel {
    pub vendor_id: String,
    pub total_reviews: i64,
    pub star_1: i64,
    pub star_2: i64,
    pub star_3: i64,
    pub star_4: i64,
    pub star_5: i64,
    pub average_rating: f64,
    pub thirty_day_count: i64,
    pub thirty_day_average: f64,
    pub last_updated: Option<i64>,
}

/// Database model for the vendor_sync_state table
#[derive(Debug, Clone, FromRow)]
pub struct SyncStateModel {
    pub vendor_id: String,
    pub last_pulled_at: i64,
}
