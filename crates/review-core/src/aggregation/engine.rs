//! Aggregation engine
//!
//! Two maintenance strategies over [`VendorReviewAggregate`]:
//!
//! - [`AggregationEngine::apply_delta`] adjusts one histogram bucket and
//!   recomputes the average from the full histogram, so floating error never
//!   accumulates across calls.
//! - [`AggregationEngine::recompute_from_scratch`] rebuilds everything from the
//!   current set of active reviews. It is the repair path and is safe to run
//!   at any time.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::entities::{ReviewRecord, VendorReviewAggregate};
use crate::value_objects::{star_bucket, VendorId};

/// Default length of the rolling window, in days
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Direction of a single-review change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingDelta {
    Add,
    Remove,
}

/// Pure computation over review ratings
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    window: Duration,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregationEngine {
    /// Engine with the default 30-day window
    pub fn new() -> Self {
        Self {
            window: Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }

    /// Engine with a custom rolling window
    pub fn with_window(window: Duration) -> Self {
        Self { window }
    }

    /// Length of the rolling window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Add or remove one rating
    ///
    /// Returns `false` when a removal hit an empty bucket. The bucket stays at
    /// zero and the aggregate no longer matches the reviews.
    pub fn apply_delta(
        &self,
        aggregate: &mut VendorReviewAggregate,
        rating: f64,
        delta: RatingDelta,
        at: DateTime<Utc>,
    ) -> bool {
        let bucket = usize::from(star_bucket(rating) - 1);

        let applied = match delta {
            RatingDelta::Add => {
                aggregate.histogram[bucket] += 1;
                true
            }
            RatingDelta::Remove if aggregate.histogram[bucket] == 0 => {
                warn!(
                    vendor_id = %aggregate.vendor_id,
                    star = bucket + 1,
                    "Removing rating from empty bucket; aggregate has drifted"
                );
                false
            }
            RatingDelta::Remove => {
                aggregate.histogram[bucket] -= 1;
                true
            }
        };

        aggregate.total_reviews = aggregate.histogram_total();
        aggregate.average_rating = aggregate.weighted_mean();
        aggregate.last_updated = Some(at);
        applied
    }

    /// Add or remove one review, keeping the rolling-window figures in step
    ///
    /// The window mean is carried as `average * count`, so it can pick up
    /// floating error over many calls; a recompute resets it. Returns `false`
    /// on drift, as [`apply_delta`](Self::apply_delta) does.
    pub fn apply_review_delta(
        &self,
        aggregate: &mut VendorReviewAggregate,
        review: &ReviewRecord,
        delta: RatingDelta,
        at: DateTime<Utc>,
    ) -> bool {
        if !self.apply_delta(aggregate, review.rating, delta, at) {
            return false;
        }

        if !review.is_within(at, self.window) {
            return true;
        }

        let mut sum = aggregate.thirty_day_average * f64::from(aggregate.thirty_day_count);
        match delta {
            RatingDelta::Add => {
                aggregate.thirty_day_count += 1;
                sum += review.rating;
            }
            RatingDelta::Remove => {
                if aggregate.thirty_day_count == 0 {
                    return false;
                }
                aggregate.thirty_day_count -= 1;
                sum -= review.rating;
            }
        }

        aggregate.thirty_day_average = if aggregate.thirty_day_count == 0 {
            0.0
        } else {
            sum / f64::from(aggregate.thirty_day_count)
        };
        true
    }

    /// Rebuild the aggregate from the vendor's reviews
    ///
    /// Reviews that are not active are skipped, so callers may pass an
    /// unfiltered set. The result depends only on `reviews` and `now`.
    pub fn recompute_from_scratch(
        &self,
        vendor_id: &VendorId,
        reviews: &[ReviewRecord],
        now: DateTime<Utc>,
    ) -> VendorReviewAggregate {
        let mut aggregate = VendorReviewAggregate::empty(vendor_id.clone());

        let active: Vec<&ReviewRecord> = reviews
            .iter()
            .filter(|r| r.is_active() && &r.vendor_id == vendor_id)
            .collect();

        for review in &active {
            self.apply_delta(&mut aggregate, review.rating, RatingDelta::Add, now);
        }

        let recent: Vec<f64> = active
            .iter()
            .filter(|r| r.is_within(now, self.window))
            .map(|r| r.rating)
            .collect();

        aggregate.thirty_day_count = recent.len() as u32;
        aggregate.thirty_day_average = if recent.is_empty() {
            0.0
        } else {
            recent.iter().sum::<f64>() / recent.len() as f64
        };
        aggregate.last_updated = Some(now);

        aggregate
    }
}
