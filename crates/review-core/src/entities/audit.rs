//! Audit entry entity - append-only record of a moderation action

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{ReviewId, VendorId};

/// Moderation action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    SoftDelete,
    Flag,
    ReplyAdded,
    ReplyEdited,
    ReplyDeleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoftDelete => "SOFT_DELETE",
            Self::Flag => "FLAG",
            Self::ReplyAdded => "REPLY_ADDED",
            Self::ReplyEdited => "REPLY_EDITED",
            Self::ReplyDeleted => "REPLY_DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SOFT_DELETE" => Some(Self::SoftDelete),
            "FLAG" => Some(Self::Flag),
            "REPLY_ADDED" => Some(Self::ReplyAdded),
            "REPLY_EDITED" => Some(Self::ReplyEdited),
            "REPLY_DELETED" => Some(Self::ReplyDeleted),
            _ => None,
        }
    }
}

/// Audit entry. Fields are private so an entry cannot change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    entry_id: Uuid,
    action: AuditAction,
    review_id: ReviewId,
    vendor_id: VendorId,
    reason: Option<String>,
    timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Record a new moderation action
    pub fn new(
        action: AuditAction,
        review_id: ReviewId,
        vendor_id: VendorId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            action,
            review_id,
            vendor_id,
            reason,
            timestamp,
        }
    }

    /// Rebuild a stored entry (used by storage mappers)
    pub fn restore(
        entry_id: Uuid,
        action: AuditAction,
        review_id: ReviewId,
        vendor_id: VendorId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_id,
            action,
            review_id,
            vendor_id,
            reason,
            timestamp,
        }
    }

    pub fn entry_id(&self) -> Uuid {
        self.entry_id
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn review_id(&self) -> &ReviewId {
        &self.review_id
    }

    pub fn vendor_id(&self) -> &VendorId {
        &self.vendor_id
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
