//! Moderation service
//!
//! Hides and flags reviews, and reads the vendor's moderation audit trail.

use tracing::instrument;
use validator::Validate;

use review_core::{AuditEntry, ReviewId, ReviewMutation, VendorId};

use crate::dto::{FlagRequest, MutationOutcome, SoftDeleteRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::sync::SyncCoordinator;

/// Moderation service
pub struct ModerationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ModerationService<'a> {
    /// Create a new ModerationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Hide an active review from listings and from the aggregate
    #[instrument(skip(self, request))]
    pub async fn soft_delete(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        request: SoftDeleteRequest,
    ) -> ServiceResult<MutationOutcome> {
        request.validate()?;

        SyncCoordinator::new(self.ctx)
            .apply_mutation(
                vendor_id,
                review_id,
                ReviewMutation::SoftDelete {
                    reason: request.reason,
                },
            )
            .await
    }

    /// Flag a review for attention; it stays listed and counted
    #[instrument(skip(self, request))]
    pub async fn flag(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        request: FlagRequest,
    ) -> ServiceResult<MutationOutcome> {
        request.validate()?;

        SyncCoordinator::new(self.ctx)
            .apply_mutation(
                vendor_id,
                review_id,
                ReviewMutation::Flag {
                    reason: request.reason,
                },
            )
            .await
    }

    /// The vendor's moderation audit trail, newest first
    #[instrument(skip(self))]
    pub async fn history(&self, vendor_id: &VendorId) -> ServiceResult<Vec<AuditEntry>> {
        self.ctx.require_identity(vendor_id)?;

        self.ctx
            .remote_call(
                "list_audit_entries",
                self.ctx.remote().list_audit_entries(vendor_id),
            )
            .await
    }
}
