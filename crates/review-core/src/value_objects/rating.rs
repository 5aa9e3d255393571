//! Star rating buckets
//!
//! Ratings are stored and averaged as real numbers. Only histogram
//! bucketing rounds them, using round-half-up into `MIN_STARS..=MAX_STARS`.

/// Lowest histogram bucket
pub const MIN_STARS: u8 = 1;

/// Highest histogram bucket
pub const MAX_STARS: u8 = 5;

/// Map a real-valued rating to its histogram bucket (1-5)
///
/// `4.5` lands in the 5 bucket, `4.49` in the 4 bucket. Out-of-range and
/// non-finite ratings are clamped to the nearest valid bucket.
pub fn star_bucket(rating: f64) -> u8 {
    if !rating.is_finite() {
        return MIN_STARS;
    }
    let rounded = (rating + 0.5).floor();
    rounded.clamp(f64::from(MIN_STARS), f64::from(MAX_STARS)) as u8
}
