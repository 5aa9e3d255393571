//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use review_core::{DomainError, RemoteFailure};
use std::fmt;

/// Service layer error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No signed-in vendor, or the vendor does not own the target
    NotAuthenticated(String),

    /// Remote store offline, timed out or failed
    RemoteUnavailable(RemoteFailure),

    /// Resource not found
    NotFound { resource: &'static str, id: String },

    /// Action not allowed in the review's current state
    InvalidTransition(String),

    /// Validation error
    Validation(String),

    /// Local cache failure
    Cache(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated(msg) => write!(f, "Not authenticated: {msg}"),
            Self::RemoteUnavailable(failure) => write!(f, "Remote store unavailable: {failure}"),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::InvalidTransition(msg) => write!(f, "Invalid transition: {msg}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Cache(msg) => write!(f, "Cache error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RemoteUnavailable(failure) => Some(failure),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not authenticated error
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::NotAuthenticated(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the error code for callers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated(_) => "NOT_AUTHENTICATED",
            Self::RemoteUnavailable(RemoteFailure::Offline) => "REMOTE_OFFLINE",
            Self::RemoteUnavailable(RemoteFailure::Timeout) => "REMOTE_TIMEOUT",
            Self::RemoteUnavailable(RemoteFailure::Service(_)) => "REMOTE_UNAVAILABLE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotAuthenticated(msg) => Self::NotAuthenticated(msg),
            DomainError::RemoteUnavailable(failure) => Self::RemoteUnavailable(failure),
            DomainError::ReviewNotFound(id) => Self::not_found("Review", id.into_inner()),
            DomainError::ReplyNotFound(id) => Self::not_found("Reply", id.into_inner()),
            DomainError::InvalidTransition(msg) => Self::InvalidTransition(msg),
            DomainError::ValidationError(msg) => Self::Validation(msg),
            DomainError::CacheError(msg) => Self::Cache(msg),
            DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<RemoteFailure> for ServiceError {
    fn from(failure: RemoteFailure) -> Self {
        Self::RemoteUnavailable(failure)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
