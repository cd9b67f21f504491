//! Controller error types.

use thiserror::Error;

/// Result type alias for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors raised while evaluating a single policy.
///
/// None of these stop the loop: the failing policy is skipped for the
/// current tick and picked up again on the next one. Sibling policies
/// are never affected.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("metrics fetch failed for {service}: {source}")]
    Metrics {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("scaling execution failed for {service}: {source}")]
    Scaling {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Policy(#[from] gridscale_policy::PolicyError),
}
