//! Value objects - immutable domain primitives

mod ids;
mod rating;

pub use ids::{CustomerId, ReviewId, VendorId};
pub use rating::{star_bucket, MAX_STARS, MIN_STARS};
