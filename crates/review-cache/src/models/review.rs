//! Review database model

use sqlx::FromRow;

/// Database model for the reviews table
#[derive(Debug, Clone, FromRow)]
pub struct ReviewModel {
    pub vendor_id: String,
    pub review_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub rating: f64,
    pub star: i64,
    pub text: String,
    /// JSON array of URLs
    pub image_urls: String,
    pub created_at: i64,
    pub is_verified_purchase: bool,
    pub is_anonymous: bool,
    pub helpful_count: i64,
    pub status: String,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub flagged_at: Option<i64>,
    pub reply_vendor_id: Option<String>,
    pub reply_vendor_name: Option<String>,
    pub reply_text: Option<String>,
    pub reply_created_at: Option<i64>,
    pub reply_edited_at: Option<i64>,
    pub reply_status: Option<String>,
    pub last_synced_at: Option<i64>,
}

impl ReviewModel {
    /// Column list shared by every SELECT over the reviews table
    pub const COLUMNS: &'static str = "vendor_id, review_id, customer_id, customer_name, rating, \
        star, text, image_urls, created_at, is_verified_purchase, is_anonymous, helpful_count, \
        status, flagged, flag_reason, flagged_at, reply_vendor_id, reply_vendor_name, reply_text, \
        reply_created_at, reply_edited_at, reply_status, last_synced_at";

    /// Check if the row carries a vendor reply
    #[inline]
    pub fn has_reply(&self) -> bool {
        self.reply_text.is_some()
    }
}
