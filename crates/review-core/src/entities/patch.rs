//! Review patches - the fields a mutation writes
//!
//! A single patch value is written to the remote store and, after the remote
//! commit succeeds, applied to the cached record, so both sides end up with
//! identical field values.
//!
//! A [`ReviewPrecondition`] travels with the patch so the remote store can
//! refuse a write whose starting state no longer holds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ReviewRecord, ReviewStatus, VendorReply};
use crate::error::DomainError;

/// Flag fields written by a flag action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagPatch {
    pub reason: String,
    pub flagged_at: DateTime<Utc>,
}

/// Reply change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyPatch {
    /// Set (or replace) the reply
    Set(VendorReply),
    /// Replace the text of whatever reply the target record holds
    Edit {
        text: String,
        edited_at: DateTime<Utc>,
    },
    /// Remove every reply field
    Clear,
}

/// Partial update of a review document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub status: Option<ReviewStatus>,
    pub flag: Option<FlagPatch>,
    pub reply: Option<ReplyPatch>,
}

impl ReviewPatch {
    /// Patch that changes only the status
    pub fn status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that flags the review
    pub fn flag(reason: String, flagged_at: DateTime<Utc>) -> Self {
        Self {
            flag: Some(FlagPatch { reason, flagged_at }),
            ..Self::default()
        }
    }

    /// Patch that sets the reply
    pub fn set_reply(reply: VendorReply) -> Self {
        Self {
            reply: Some(ReplyPatch::Set(reply)),
            ..Self::default()
        }
    }

    /// Patch that edits the existing reply in place
    pub fn edit_reply(text: String, edited_at: DateTime<Utc>) -> Self {
        Self {
            reply: Some(ReplyPatch::Edit { text, edited_at }),
            ..Self::default()
        }
    }

    /// Patch that clears the reply
    pub fn clear_reply() -> Self {
        Self {
            reply: Some(ReplyPatch::Clear),
            ..Self::default()
        }
    }

    /// Check if the patch writes nothing
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.flag.is_none() && self.reply.is_none()
    }

    /// Check if the patch changes what the aggregate counts
    #[inline]
    pub fn touches_rating(&self) -> bool {
        self.status.is_some()
    }

    /// Apply the patch to a record in place
    pub fn apply(&self, record: &mut ReviewRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }

        if let Some(flag) = &self.flag {
            record.flagged = true;
            record.flag_reason = Some(flag.reason.clone());
            record.flagged_at = Some(flag.flagged_at);
        }

        match &self.reply {
            Some(ReplyPatch::Set(reply)) => record.reply = Some(reply.clone()),
            Some(ReplyPatch::Edit { text, edited_at }) => {
                record.reply = record
                    .reply
                    .as_ref()
                    .map(|reply| reply.edited(text.clone(), *edited_at));
            }
            Some(ReplyPatch::Clear) => record.reply = None,
            None => {}
        }
    }

    /// Apply the patch to a copy of the record
    pub fn applied_to(&self, record: &ReviewRecord) -> ReviewRecord {
        let mut updated = record.clone();
        self.apply(&mut updated);
        updated
    }
}

/// State a review must be in for a patch to be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewPrecondition {
    /// Exact status required
    pub status: Option<ReviewStatus>,
    /// Review must not be hidden
    pub visible: bool,
    /// Required reply presence
    pub has_reply: Option<bool>,
}

impl ReviewPrecondition {
    /// No requirement at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    pub fn with_reply(mut self, present: bool) -> Self {
        self.has_reply = Some(present);
        self
    }

    /// Check `record` against the precondition
    ///
    /// # Errors
    /// `InvalidTransition` for a status mismatch or an existing reply,
    /// `ReplyNotFound` when a reply is required but missing
    pub fn check(&self, record: &ReviewRecord) -> Result<(), DomainError> {
        if let Some(status) = self.status {
            if record.status != status {
                return Err(DomainError::invalid_transition(format!(
                    "review {} is {}, expected {}",
                    record.review_id,
                    record.status.as_str(),
                    status.as_str()
                )));
            }
        }

        if self.visible && !record.status.is_visible() {
            return Err(DomainError::invalid_transition(format!(
                "review {} is hidden",
                record.review_id
            )));
        }

        match self.has_reply {
            Some(true) if !record.has_reply() => {
                Err(DomainError::ReplyNotFound(record.review_id.clone()))
            }
            Some(false) if record.has_reply() => Err(DomainError::invalid_transition(format!(
                "review {} already has a reply",
                record.review_id
            ))),
            _ => Ok(()),
        }
    }
}
