//! Test fixtures and data generators

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use review_core::{CustomerId, ReviewId, ReviewRecord, ReviewStatus, VendorId};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Fixed "now" for every test clock, on a millisecond boundary
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_760_000_000_000)
        .single()
        .expect("valid test timestamp")
}

/// A vendor id no other test uses
pub fn unique_vendor() -> VendorId {
    VendorId::new(format!("vendor-{}", unique_suffix()))
}

/// Builder for review records
#[derive(Debug, Clone)]
pub struct ReviewBuilder {
    record: ReviewRecord,
}

impl ReviewBuilder {
    pub fn new(vendor_id: &VendorId, id: &str, rating: f64) -> Self {
        Self {
            record: ReviewRecord::new(
                ReviewId::new(id),
                vendor_id.clone(),
                CustomerId::new(format!("customer-{id}")),
                format!("Customer {id}"),
                rating,
                format!("Review {id}"),
                base_time() - Duration::days(1),
            ),
        }
    }

    pub fn days_ago(mut self, days: i64) -> Self {
        self.record.created_at = base_time() - Duration::days(days);
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.record.text = text.to_string();
        self
    }

    pub fn customer(mut self, name: &str) -> Self {
        self.record.customer_display_name = name.to_string();
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.record.is_anonymous = true;
        self
    }

    pub fn helpful(mut self, count: u32) -> Self {
        self.record.helpful_count = count;
        self
    }

    pub fn status(mut self, status: ReviewStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn build(self) -> ReviewRecord {
        self.record
    }
}
