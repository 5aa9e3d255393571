//! Data transfer objects for service inputs and outputs
//!
//! - Request DTOs validated before any state is read
//! - Response DTOs describing what a call changed

pub mod requests;
pub mod responses;

pub use requests::{FlagRequest, ReplyRequest, SoftDeleteRequest};
pub use responses::{MutationOutcome, RefreshSummary};
