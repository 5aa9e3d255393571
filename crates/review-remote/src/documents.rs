//! Wire documents
//!
//! Field names follow the remote document store's camelCase convention.
//! Timestamps are epoch milliseconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A review document under `vendors/{vendorId}/reviews/{reviewId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDocument {
    pub review_id: String,
    pub vendor_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub rating: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub created_at: i64,
    #[serde(default)]
    pub is_verified_purchase: bool,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub helpful_count: u32,
    pub status: String,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flagged_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_reply: Option<VendorReplyDocument>,
}

/// Reply embedded in a review document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorReplyDocument {
    pub vendor_id: String,
    pub vendor_name: String,
    pub text: String,
    pub created_at: i64,
    /// 0 when the reply was never edited
    #[serde(default)]
    pub edited_at: i64,
    #[serde(default)]
    pub is_edited: bool,
    pub status: String,
}

/// The aggregate document under `vendors/{vendorId}/stats/reviews`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDocument {
    pub vendor_id: String,
    pub total_reviews: u32,
    /// Keys "1" through "5"
    pub rating_distribution: BTreeMap<String, u32>,
    pub average_rating: f64,
    #[serde(default)]
    pub thirty_day_count: u32,
    #[serde(default)]
    pub thirty_day_average: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

/// An audit document under `vendors/{vendorId}/moderationLog/{entryId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDocument {
    pub entry_id: String,
    pub action: String,
    pub review_id: String,
    pub vendor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: i64,
}
