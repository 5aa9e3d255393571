//! Vendor reply entity - at most one per review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::VendorId;

/// Reply status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStatus {
    #[default]
    Active,
    Deleted,
}

impl ReplyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Vendor reply entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorReply {
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub status: ReplyStatus,
}

impl VendorReply {
    /// Create a new, unedited reply
    pub fn new(vendor_id: VendorId, vendor_name: String, text: String, at: DateTime<Utc>) -> Self {
        Self {
            vendor_id,
            vendor_name,
            text,
            created_at: at,
            edited_at: None,
            status: ReplyStatus::Active,
        }
    }

    /// Check if the reply has been edited
    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Produce the edited version of this reply; `created_at` is preserved
    pub fn edited(&self, text: String, at: DateTime<Utc>) -> Self {
        Self {
            text,
            edited_at: Some(at),
            ..self.clone()
        }
    }
}
