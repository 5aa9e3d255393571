//! Per-vendor rating aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{VendorId, MAX_STARS, MIN_STARS};

/// Aggregate statistics over a vendor's active reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorReviewAggregate {
    pub vendor_id: VendorId,
    pub total_reviews: u32,
    /// Counts per star; index 0 holds 1-star reviews
    pub histogram: [u32; 5],
    pub average_rating: f64,
    pub thirty_day_count: u32,
    pub thirty_day_average: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl VendorReviewAggregate {
    /// Zero-valued aggregate, used when none exists yet
    pub fn empty(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            total_reviews: 0,
            histogram: [0; 5],
            average_rating: 0.0,
            thirty_day_count: 0,
            thirty_day_average: 0.0,
            last_updated: None,
        }
    }

    /// Count of reviews in a star bucket (0 for out-of-range stars)
    pub fn count_for(&self, star: u8) -> u32 {
        if (MIN_STARS..=MAX_STARS).contains(&star) {
            self.histogram[usize::from(star - 1)]
        } else {
            0
        }
    }

    /// Share of reviews in a star bucket, as a percentage
    pub fn percentage_for(&self, star: u8) -> f64 {
        if self.total_reviews == 0 {
            return 0.0;
        }
        f64::from(self.count_for(star)) * 100.0 / f64::from(self.total_reviews)
    }

    /// Sum of the histogram buckets
    pub fn histogram_total(&self) -> u32 {
        self.histogram.iter().sum()
    }

    /// Histogram-weighted mean rating (0 when empty)
    pub fn weighted_mean(&self) -> f64 {
        let total = self.histogram_total();
        if total == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .histogram
            .iter()
            .zip(1u64..)
            .map(|(count, star)| u64::from(*count) * star)
            .sum();
        weighted as f64 / f64::from(total)
    }

    /// Check if the vendor has any counted reviews
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_reviews == 0
    }

    /// Verify the count and average invariants
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        let sum = self.histogram_total();
        if self.total_reviews != sum {
            return Err(DomainError::Internal(format!(
                "aggregate for {}: total_reviews {} != histogram sum {}",
                self.vendor_id, self.total_reviews, sum
            )));
        }

        let expected = self.weighted_mean();
        if (self.average_rating - expected).abs() > 1e-9 {
            return Err(DomainError::Internal(format!(
                "aggregate for {}: average_rating {} != weighted mean {}",
                self.vendor_id, self.average_rating, expected
            )));
        }

        Ok(())
    }
}
