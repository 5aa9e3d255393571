//! Request DTOs
//!
//! All request DTOs implement `Deserialize` and `Validate`.

use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Reject text that is empty once trimmed
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Hide a review from public listings
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct SoftDeleteRequest {
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

impl SoftDeleteRequest {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

/// Report a review for moderation
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FlagRequest {
    #[validate(
        length(min = 1, max = 500, message = "Reason must be 1-500 characters"),
        custom(function = "not_blank")
    )]
    pub reason: String,
}

impl FlagRequest {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Create or edit the vendor's public reply
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(
        length(min = 1, max = 1000, message = "Reply must be 1-1000 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,
}

impl ReplyRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
