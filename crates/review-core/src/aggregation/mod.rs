//! Rating aggregation - incremental and full-rescan maintenance of
//! per-vendor review statistics

mod engine;

pub use engine::{AggregationEngine, RatingDelta, DEFAULT_WINDOW_DAYS};
