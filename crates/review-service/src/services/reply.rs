//! Reply service
//!
//! A review carries at most one vendor reply. Adding, editing and deleting
//! it are audited like any other moderation action.

use tracing::instrument;
use validator::Validate;

use review_core::{ReviewId, ReviewMutation, VendorId};

use crate::dto::{MutationOutcome, ReplyRequest};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::sync::SyncCoordinator;

/// Reply service
pub struct ReplyService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReplyService<'a> {
    /// Create a new ReplyService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Attach a reply signed with the current vendor's name
    #[instrument(skip(self, request))]
    pub async fn add(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        request: ReplyRequest,
    ) -> ServiceResult<MutationOutcome> {
        request.validate()?;

        SyncCoordinator::new(self.ctx)
            .apply_mutation(
                vendor_id,
                review_id,
                ReviewMutation::AddReply { text: request.text },
            )
            .await
    }

    /// Replace the reply text
    #[instrument(skip(self, request))]
    pub async fn edit(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
        request: ReplyRequest,
    ) -> ServiceResult<MutationOutcome> {
        request.validate()?;

        SyncCoordinator::new(self.ctx)
            .apply_mutation(
                vendor_id,
                review_id,
                ReviewMutation::EditReply { text: request.text },
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        vendor_id: &VendorId,
        review_id: &ReviewId,
    ) -> ServiceResult<MutationOutcome> {
        SyncCoordinator::new(self.ctx)
            .apply_mutation(vendor_id, review_id, ReviewMutation::DeleteReply)
            .await
    }
}
