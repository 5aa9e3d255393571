//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::ReviewId;

/// Why the remote store could not be reached
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteFailure {
    #[error("device is offline")]
    Offline,

    #[error("request timed out")]
    Timeout,

    #[error("service error: {0}")]
    Service(String),
}

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Authentication Errors
    // =========================================================================
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteFailure),

    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Review not found: {0}")]
    ReviewNotFound(ReviewId),

    #[error("Reply not found on review: {0}")]
    ReplyNotFound(ReviewId),

    // =========================================================================
    // State Machine Errors
    // =========================================================================
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Get a stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated(_) => "NOT_AUTHENTICATED",
            Self::RemoteUnavailable(RemoteFailure::Offline) => "REMOTE_OFFLINE",
            Self::RemoteUnavailable(RemoteFailure::Timeout) => "REMOTE_TIMEOUT",
            Self::RemoteUnavailable(RemoteFailure::Service(_)) => "REMOTE_UNAVAILABLE",
            Self::ReviewNotFound(_) => "UNKNOWN_REVIEW",
            Self::ReplyNotFound(_) => "UNKNOWN_REPLY",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for an invalid state transition
    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    /// Shorthand for a validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ReviewNotFound(_) | Self::ReplyNotFound(_))
    }

    /// Check if the remote store could not be reached
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Check if the error was raised before touching the network
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated(_) | Self::InvalidTransition(_) | Self::ValidationError(_)
        )
    }
}
