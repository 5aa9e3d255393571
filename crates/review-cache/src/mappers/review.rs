//! Review entity <-> model mapper

use review_core::entities::{ReplyStatus, ReviewRecord, ReviewStatus, VendorReply};
use review_core::error::DomainError;
use review_core::value_objects::{CustomerId, ReviewId, VendorId};

use super::{corrupt_row, from_millis, from_millis_opt, to_count, to_millis};
use crate::models::ReviewModel;

/// Convert ReviewModel to ReviewRecord entity
impl TryFrom<ReviewModel> for ReviewRecord {
    type Error = DomainError;

    fn try_from(model: ReviewModel) -> Result<Self, Self::Error> {
        let status = ReviewStatus::parse(&model.status)
            .ok_or_else(|| corrupt_row(format!("unknown review status {}", model.status)))?;
        let image_urls: Vec<String> = serde_json::from_str(&model.image_urls)
            .map_err(|e| corrupt_row(format!("image_urls: {e}")))?;
        let reply = reply_from_columns(&model)?;

        Ok(ReviewRecord {
            review_id: ReviewId::new(model.review_id),
            vendor_id: VendorId::new(model.vendor_id),
            customer_id: CustomerId::new(model.customer_id),
            customer_display_name: model.customer_name,
            rating: model.rating,
            text: model.text,
            image_urls,
            created_at: from_millis("created_at", model.created_at)?,
            is_verified_purchase: model.is_verified_purchase,
            is_anonymous: model.is_anonymous,
            helpful_count: to_count("helpful_count", model.helpful_count)?,
            status,
            flagged: model.flagged,
            flag_reason: model.flag_reason,
            flagged_at: from_millis_opt("flagged_at", model.flagged_at)?,
            reply,
            last_synced_at: from_millis_opt("last_synced_at", model.last_synced_at)?,
        })
    }
}

fn reply_from_columns(model: &ReviewModel) -> Result<Option<VendorReply>, DomainError> {
    let Some(text) = model.reply_text.clone() else {
        return Ok(None);
    };

    let (Some(vendor_id), Some(vendor_name), Some(created_at), Some(status)) = (
        model.reply_vendor_id.clone(),
        model.reply_vendor_name.clone(),
        model.reply_created_at,
        model.reply_status.as_deref(),
    ) else {
        return Err(corrupt_row(format!(
            "incomplete reply columns on review {}",
            model.review_id
        )));
    };

    Ok(Some(VendorReply {
        vendor_id: VendorId::new(vendor_id),
        vendor_name,
        text,
        created_at: from_millis("reply_created_at", created_at)?,
        edited_at: from_millis_opt("reply_edited_at", model.reply_edited_at)?,
        status: ReplyStatus::parse(status)
            .ok_or_else(|| corrupt_row(format!("unknown reply status {status}")))?,
    }))
}

/// Values of a ReviewRecord flattened for insertion
pub struct ReviewInsert<'a> {
    pub vendor_id: &'a str,
    pub review_id: &'a str,
    pub customer_id: &'a str,
    pub customer_name: &'a str,
    pub rating: f64,
    pub star: i64,
    pub text: &'a str,
    /// Lowercased text and customer name, matched by listing searches
    pub search_text: String,
    pub image_urls: String,
    pub created_at: i64,
    pub is_verified_purchase: bool,
    pub is_anonymous: bool,
    pub helpful_count: i64,
    pub status: &'static str,
    pub flagged: bool,
    pub flag_reason: Option<&'a str>,
    pub flagged_at: Option<i64>,
    pub reply_vendor_id: Option<&'a str>,
    pub reply_vendor_name: Option<&'a str>,
    pub reply_text: Option<&'a str>,
    pub reply_created_at: Option<i64>,
    pub reply_edited_at: Option<i64>,
    pub reply_status: Option<&'static str>,
}

impl<'a> ReviewInsert<'a> {
    pub fn new(record: &'a ReviewRecord) -> Result<Self, DomainError> {
        let image_urls = serde_json::to_string(&record.image_urls)
            .map_err(|e| DomainError::CacheError(format!("image_urls: {e}")))?;
        let reply = record.reply.as_ref();

        Ok(Self {
            vendor_id: record.vendor_id.as_str(),
            review_id: record.review_id.as_str(),
            customer_id: record.customer_id.as_str(),
            customer_name: &record.customer_display_name,
            rating: record.rating,
            star: i64::from(record.star()),
            text: &record.text,
            search_text: search_text(record),
            image_urls,
            created_at: to_millis(record.created_at),
            is_verified_purchase: record.is_verified_purchase,
            is_anonymous: record.is_anonymous,
            helpful_count: i64::from(record.helpful_count),
            status: record.status.as_str(),
            flagged: record.flagged,
            flag_reason: record.flag_reason.as_deref(),
            flagged_at: record.flagged_at.map(to_millis),
            reply_vendor_id: reply.map(|r| r.vendor_id.as_str()),
            reply_vendor_name: reply.map(|r| r.vendor_name.as_str()),
            reply_text: reply.map(|r| r.text.as_str()),
            reply_created_at: reply.map(|r| to_millis(r.created_at)),
            reply_edited_at: reply.and_then(|r| r.edited_at).map(to_millis),
            reply_status: reply.map(|r| r.status.as_str()),
        })
    }
}

/// Unicode-lowercased search column value
///
/// SQLite's `LOWER()` folds ASCII only, so case folding happens here.
fn search_text(record: &ReviewRecord) -> String {
    format!("{}\u{1f}{}", record.text, record.customer_display_name).to_lowercase()
}
