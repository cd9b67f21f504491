//! Error types for the policy registry.

use thiserror::Error;

/// Result type alias for policy registry operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors from policy registration and lookup.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid policy: {0}")]
    Validation(String),

    #[error("no policy registered for service: {0}")]
    NotFound(String),
}
