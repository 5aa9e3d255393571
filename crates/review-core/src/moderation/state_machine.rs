//! Moderation state machine
//!
//! Visibility: `ACTIVE -> HIDDEN`, one way. Flagging is an independent
//! attribute with no reverse operation.
//!
//! Reply: `NONE -> ACTIVE -> ACTIVE (edited) -> NONE`. Deleting a reply
//! clears its fields rather than keeping a tombstone.
//!
//! Payloads are checked by [`ReviewMutation::validate`] without a record. State
//! checks run against the caller's copy of the record, and the same checks are
//! carried in the transition's precondition for the remote store to repeat
//! against the authoritative copy.

use chrono::{DateTime, Utc};

use crate::aggregation::RatingDelta;
use crate::entities::{
    AuditAction, AuditEntry, ReviewPatch, ReviewPrecondition, ReviewRecord, ReviewStatus,
    VendorIdentity, VendorReply,
};
use crate::error::DomainError;

/// Maximum reply body length, in characters
pub const MAX_REPLY_LENGTH: usize = 1000;

/// Maximum moderation reason length, in characters
pub const MAX_REASON_LENGTH: usize = 500;

/// A validated state change, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub patch: ReviewPatch,
    /// State the remote copy must still be in when the patch is written
    pub precondition: ReviewPrecondition,
    pub audit: AuditEntry,
    /// Aggregate change caused by the transition, if any
    pub rating_delta: Option<RatingDelta>,
}

impl Transition {
    fn new(patch: ReviewPatch, precondition: ReviewPrecondition, audit: AuditEntry) -> Self {
        let rating_delta = patch.touches_rating().then_some(RatingDelta::Remove);
        Self {
            patch,
            precondition,
            audit,
            rating_delta,
        }
    }

    /// Check if the aggregate must be updated after the write
    #[inline]
    pub fn affects_rating(&self) -> bool {
        self.rating_delta.is_some()
    }
}

/// A moderation action requested against one review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewMutation {
    SoftDelete { reason: Option<String> },
    Flag { reason: String },
    AddReply { text: String },
    EditReply { text: String },
    DeleteReply,
}

impl ReviewMutation {
    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SoftDelete { .. } => "soft_delete",
            Self::Flag { .. } => "flag",
            Self::AddReply { .. } => "add_reply",
            Self::EditReply { .. } => "edit_reply",
            Self::DeleteReply => "delete_reply",
        }
    }

    /// Trim and bound-check the payload
    ///
    /// Needs no record, so callers run it before any I/O.
    pub fn validate(self) -> Result<Self, DomainError> {
        Ok(match self {
            Self::SoftDelete { reason } => Self::SoftDelete {
                reason: normalize_optional(reason, "Reason", MAX_REASON_LENGTH)?,
            },
            Self::Flag { reason } => Self::Flag {
                reason: normalize_required(&reason, "Reason", MAX_REASON_LENGTH)?,
            },
            Self::AddReply { text } => Self::AddReply {
                text: normalize_required(&text, "Reply", MAX_REPLY_LENGTH)?,
            },
            Self::EditReply { text } => Self::EditReply {
                text: normalize_required(&text, "Reply", MAX_REPLY_LENGTH)?,
            },
            Self::DeleteReply => Self::DeleteReply,
        })
    }
}

/// Stateless transition rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ModerationStateMachine;

impl ModerationStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Validate `mutation` against the current record
    pub fn transition(
        &self,
        record: &ReviewRecord,
        identity: &VendorIdentity,
        mutation: ReviewMutation,
        at: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        match mutation {
            ReviewMutation::SoftDelete { reason } => self.soft_delete(record, reason, at),
            ReviewMutation::Flag { reason } => self.flag(record, reason, at),
            ReviewMutation::AddReply { text } => self.add_reply(record, identity, &text, at),
            ReviewMutation::EditReply { text } => self.edit_reply(record, &text, at),
            ReviewMutation::DeleteReply => self.delete_reply(record, at),
        }
    }

    /// Hide a review. Only active reviews can be hidden.
    pub fn soft_delete(
        &self,
        record: &ReviewRecord,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let reason = normalize_optional(reason, "Reason", MAX_REASON_LENGTH)?;
        let precondition = ReviewPrecondition::status(ReviewStatus::Active);
        precondition.check(record)?;

        let audit = AuditEntry::new(
            AuditAction::SoftDelete,
            record.review_id.clone(),
            record.vendor_id.clone(),
            reason,
            at,
        );

        Ok(Transition::new(
            ReviewPatch::status(ReviewStatus::Hidden),
            precondition,
            audit,
        ))
    }

    /// Flag a review for attention. Status and aggregate are unaffected.
    pub fn flag(
        &self,
        record: &ReviewRecord,
        reason: String,
        at: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let reason = normalize_required(&reason, "Reason", MAX_REASON_LENGTH)?;
        ensure_visible(record, "flagged")?;

        let audit = AuditEntry::new(
            AuditAction::Flag,
            record.review_id.clone(),
            record.vendor_id.clone(),
            Some(reason.clone()),
            at,
        );

        Ok(Transition::new(
            ReviewPatch::flag(reason, at),
            ReviewPrecondition::visible(),
            audit,
        ))
    }

    /// Attach the vendor's reply. A review holds at most one reply.
    pub fn add_reply(
        &self,
        record: &ReviewRecord,
        identity: &VendorIdentity,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let text = normalize_required(text, "Reply", MAX_REPLY_LENGTH)?;
        ensure_visible(record, "replied to")?;

        if record.has_reply() {
            return Err(DomainError::invalid_transition(format!(
                "review {} already has a reply",
                record.review_id
            )));
        }

        let reply = VendorReply::new(
            identity.vendor_id.clone(),
            identity.vendor_name.clone(),
            text,
            at,
        );
        let audit = AuditEntry::new(
            AuditAction::ReplyAdded,
            record.review_id.clone(),
            record.vendor_id.clone(),
            None,
            at,
        );

        Ok(Transition::new(
            ReviewPatch::set_reply(reply),
            ReviewPrecondition::visible().with_reply(false),
            audit,
        ))
    }

    /// Replace the reply text, keeping its original creation time
    pub fn edit_reply(
        &self,
        record: &ReviewRecord,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        let text = normalize_required(text, "Reply", MAX_REPLY_LENGTH)?;
        ensure_visible(record, "replied to")?;

        let precondition = ReviewPrecondition::visible().with_reply(true);
        precondition.check(record)?;

        let audit = AuditEntry::new(
            AuditAction::ReplyEdited,
            record.review_id.clone(),
            record.vendor_id.clone(),
            None,
            at,
        );

        Ok(Transition::new(
            ReviewPatch::edit_reply(text, at),
            precondition,
            audit,
        ))
    }

    /// Remove the reply entirely
    pub fn delete_reply(
        &self,
        record: &ReviewRecord,
        at: DateTime<Utc>,
    ) -> Result<Transition, DomainError> {
        if !record.has_reply() {
            return Err(DomainError::ReplyNotFound(record.review_id.clone()));
        }

        let audit = AuditEntry::new(
            AuditAction::ReplyDeleted,
            record.review_id.clone(),
            record.vendor_id.clone(),
            None,
            at,
        );

        Ok(Transition::new(
            ReviewPatch::clear_reply(),
            ReviewPrecondition::none().with_reply(true),
            audit,
        ))
    }
}

fn ensure_visible(record: &ReviewRecord, action: &str) -> Result<(), DomainError> {
    if record.status.is_visible() {
        Ok(())
    } else {
        Err(DomainError::invalid_transition(format!(
            "hidden review {} cannot be {action}",
            record.review_id
        )))
    }
}

fn normalize_required(value: &str, field: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(
    value: Option<String>,
    field: &str,
    max: usize,
) -> Result<Option<String>, DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => normalize_required(&v, field, max).map(Some),
        _ => Ok(None),
    }
}
