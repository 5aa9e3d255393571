//! Entity <-> Model mappers
//!
//! Conversions between review-core entities and cache row models. Reading a
//! row can fail (unknown status string, malformed JSON, out-of-range
//! timestamp), so the row -> entity direction uses `TryFrom`.

mod aggregate;
mod review;

pub use aggregate::AggregateInsert;
pub use review::ReviewInsert;

use chrono::{DateTime, Utc};
use review_core::error::DomainError;

/// Epoch milliseconds for storage
#[inline]
pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Parse a stored epoch-milliseconds column
pub fn from_millis(column: &str, millis: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| corrupt_row(format!("{column} out of range: {millis}")))
}

fn from_millis_opt(column: &str, millis: Option<i64>) -> Result<Option<DateTime<Utc>>, DomainError> {
    millis.map(|m| from_millis(column, m)).transpose()
}

fn to_count(column: &str, value: i64) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| corrupt_row(format!("{column} out of range: {value}")))
}

fn corrupt_row(detail: String) -> DomainError {
    DomainError::CacheError(format!("corrupt cache row: {detail}"))
}
