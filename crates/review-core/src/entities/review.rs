//! Review entity - one customer review of a vendor

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::VendorReply;
use crate::value_objects::{star_bucket, CustomerId, ReviewId, VendorId};

/// Visibility status of a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    Active,
    Hidden,
    Reported,
}

impl ReviewStatus {
    /// Stable storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Hidden => "HIDDEN",
            Self::Reported => "REPORTED",
        }
    }

    /// Parse from the storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "HIDDEN" => Some(Self::Hidden),
            "REPORTED" => Some(Self::Reported),
            _ => None,
        }
    }

    /// Hidden reviews are excluded from listings and from the aggregate
    #[inline]
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

/// Review entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: ReviewId,
    pub vendor_id: VendorId,
    pub customer_id: CustomerId,
    pub customer_display_name: String,
    pub rating: f64,
    pub text: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub is_verified_purchase: bool,
    pub is_anonymous: bool,
    pub helpful_count: u32,
    pub status: ReviewStatus,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub flagged_at: Option<DateTime<Utc>>,
    pub reply: Option<VendorReply>,
    /// Cache only: when this record was last confirmed against the remote store
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ReviewRecord {
    /// Create a new active, unflagged review with no reply
    pub fn new(
        review_id: ReviewId,
        vendor_id: VendorId,
        customer_id: CustomerId,
        customer_display_name: String,
        rating: f64,
        text: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            review_id,
            vendor_id,
            customer_id,
            customer_display_name,
            rating,
            text,
            image_urls: Vec::new(),
            created_at,
            is_verified_purchase: false,
            is_anonymous: false,
            helpful_count: 0,
            status: ReviewStatus::Active,
            flagged: false,
            flag_reason: None,
            flagged_at: None,
            reply: None,
            last_synced_at: None,
        }
    }

    /// Histogram bucket for this review's rating
    #[inline]
    pub fn star(&self) -> u8 {
        star_bucket(self.rating)
    }

    /// Check if the review counts toward the aggregate
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ReviewStatus::Active
    }

    /// Check if the vendor has replied
    #[inline]
    pub fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Name shown next to the review
    pub fn display_name(&self) -> &str {
        if self.is_anonymous {
            "Anonymous"
        } else {
            &self.customer_display_name
        }
    }

    /// Check if the review was written within `window` of `now`
    pub fn is_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.created_at >= now - window
    }
}
