//! Document <-> entity mappers
//!
//! Reading a document can fail on unknown enum strings or out-of-range
//! timestamps; such documents are reported as `DomainError::Internal`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use review_core::entities::{
    AuditAction, AuditEntry, ReplyStatus, ReviewRecord, ReviewStatus, VendorReply,
    VendorReviewAggregate,
};
use review_core::error::DomainError;
use review_core::value_objects::{CustomerId, ReviewId, VendorId, MAX_STARS, MIN_STARS};

use crate::documents::{AggregateDocument, AuditDocument, ReviewDocument, VendorReplyDocument};

fn malformed(detail: String) -> DomainError {
    DomainError::Internal(format!("malformed remote document: {detail}"))
}

fn timestamp(field: &str, millis: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| malformed(format!("{field} out of range: {millis}")))
}

/// Convert ReviewDocument to ReviewRecord entity
impl TryFrom<ReviewDocument> for ReviewRecord {
    type Error = DomainError;

    fn try_from(doc: ReviewDocument) -> Result<Self, Self::Error> {
        let status = ReviewStatus::parse(&doc.status)
            .ok_or_else(|| malformed(format!("review {} has status {}", doc.review_id, doc.status)))?;

        Ok(ReviewRecord {
            created_at: timestamp("createdAt", doc.created_at)?,
            flagged_at: doc
                .flagged_at
                .map(|ms| timestamp("flaggedAt", ms))
                .transpose()?,
            reply: doc.vendor_reply.map(VendorReply::try_from).transpose()?,
            review_id: ReviewId::new(doc.review_id),
            vendor_id: VendorId::new(doc.vendor_id),
            customer_id: CustomerId::new(doc.customer_id),
            customer_display_name: doc.customer_name,
            rating: doc.rating,
            text: doc.text,
            image_urls: doc.image_urls,
            is_verified_purchase: doc.is_verified_purchase,
            is_anonymous: doc.is_anonymous,
            helpful_count: doc.helpful_count,
            status,
            flagged: doc.flagged,
            flag_reason: doc.flag_reason,
            last_synced_at: None,
        })
    }
}

/// Convert ReviewRecord entity to its document form
impl From<&ReviewRecord> for ReviewDocument {
    fn from(record: &ReviewRecord) -> Self {
        Self {
            review_id: record.review_id.as_str().to_string(),
            vendor_id: record.vendor_id.as_str().to_string(),
            customer_id: record.customer_id.as_str().to_string(),
            customer_name: record.customer_display_name.clone(),
            rating: record.rating,
            text: record.text.clone(),
            image_urls: record.image_urls.clone(),
            created_at: record.created_at.timestamp_millis(),
            is_verified_purchase: record.is_verified_purchase,
            is_anonymous: record.is_anonymous,
            helpful_count: record.helpful_count,
            status: record.status.as_str().to_string(),
            flagged: record.flagged,
            flag_reason: record.flag_reason.clone(),
            flagged_at: record.flagged_at.map(|at| at.timestamp_millis()),
            vendor_reply: record.reply.as_ref().map(VendorReplyDocument::from),
        }
    }
}

/// Convert VendorReplyDocument to VendorReply entity
///
/// `editedAt > 0` is the source of truth for the edited state.
impl TryFrom<VendorReplyDocument> for VendorReply {
    type Error = DomainError;

    fn try_from(doc: VendorReplyDocument) -> Result<Self, Self::Error> {
        let status = ReplyStatus::parse(&doc.status)
            .ok_or_else(|| malformed(format!("reply status {}", doc.status)))?;
        let edited_at = if doc.edited_at > 0 {
            Some(timestamp("vendorReply.editedAt", doc.edited_at)?)
        } else {
            None
        };

        Ok(VendorReply {
            vendor_id: VendorId::new(doc.vendor_id),
            vendor_name: doc.vendor_name,
            text: doc.text,
            created_at: timestamp("vendorReply.createdAt", doc.created_at)?,
            edited_at,
            status,
        })
    }
}

impl From<&VendorReply> for VendorReplyDocument {
    fn from(reply: &VendorReply) -> Self {
        Self {
            vendor_id: reply.vendor_id.as_str().to_string(),
            vendor_name: reply.vendor_name.clone(),
            text: reply.text.clone(),
            created_at: reply.created_at.timestamp_millis(),
            edited_at: reply.edited_at.map_or(0, |at| at.timestamp_millis()),
            is_edited: reply.is_edited(),
            status: reply.status.as_str().to_string(),
        }
    }
}

/// Convert AggregateDocument to VendorReviewAggregate entity
impl TryFrom<AggregateDocument> for VendorReviewAggregate {
    type Error = DomainError;

    fn try_from(doc: AggregateDocument) -> Result<Self, Self::Error> {
        let mut histogram = [0u32; 5];
        for (key, count) in &doc.rating_distribution {
            let star = key
                .parse::<u8>()
                .ok()
                .filter(|s| (MIN_STARS..=MAX_STARS).contains(s))
                .ok_or_else(|| malformed(format!("ratingDistribution key {key}")))?;
            histogram[usize::from(star - 1)] = *count;
        }

        Ok(VendorReviewAggregate {
            vendor_id: VendorId::new(doc.vendor_id),
            total_reviews: doc.total_reviews,
            histogram,
            average_rating: doc.average_rating,
            thirty_day_count: doc.thirty_day_count,
            thirty_day_average: doc.thirty_day_average,
            last_updated: doc
                .last_updated
                .map(|ms| timestamp("lastUpdated", ms))
                .transpose()?,
        })
    }
}

impl From<&VendorReviewAggregate> for AggregateDocument {
    fn from(aggregate: &VendorReviewAggregate) -> Self {
        let rating_distribution: BTreeMap<String, u32> = (MIN_STARS..=MAX_STARS)
            .map(|star| (star.to_string(), aggregate.count_for(star)))
            .collect();

        Self {
            vendor_id: aggregate.vendor_id.as_str().to_string(),
            total_reviews: aggregate.total_reviews,
            rating_distribution,
            average_rating: aggregate.average_rating,
            thirty_day_count: aggregate.thirty_day_count,
            thirty_day_average: aggregate.thirty_day_average,
            last_updated: aggregate.last_updated.map(|at| at.timestamp_millis()),
        }
    }
}

/// Convert AuditDocument to AuditEntry entity
impl TryFrom<AuditDocument> for AuditEntry {
    type Error = DomainError;

    fn try_from(doc: AuditDocument) -> Result<Self, Self::Error> {
        let entry_id = Uuid::parse_str(&doc.entry_id)
            .map_err(|e| malformed(format!("audit entryId {}: {e}", doc.entry_id)))?;
        let action = AuditAction::parse(&doc.action)
            .ok_or_else(|| malformed(format!("audit action {}", doc.action)))?;

        Ok(AuditEntry::restore(
            entry_id,
            action,
            ReviewId::new(doc.review_id),
            VendorId::new(doc.vendor_id),
            doc.reason,
            timestamp("timestamp", doc.timestamp)?,
        ))
    }
}

impl From<&AuditEntry> for AuditDocument {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            entry_id: entry.entry_id().to_string(),
            action: entry.action().as_str().to_string(),
            review_id: entry.review_id().as_str().to_string(),
            vendor_id: entry.vendor_id().as_str().to_string(),
            reason: entry.reason().map(str::to_string),
            timestamp: entry.timestamp().timestamp_millis(),
        }
    }
}
