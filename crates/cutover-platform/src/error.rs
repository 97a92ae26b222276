//! Error types for platform operations.

use thiserror::Error;

/// Result type alias for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors that can occur when talking to the orchestration platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform refused a manifest (schema violation, permission
    /// denied). Re-applying the same manifest fails identically, so
    /// callers must not retry.
    #[error("manifest rejected: {0}")]
    Rejected(String),

    /// A named deployment, service, or pod does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The platform refused a selector patch.
    #[error("patch rejected: {0}")]
    Patch(String),

    /// Log retrieval failed for a single pod. Degrades observability
    /// only; workflows report it as a warning.
    #[error("log retrieval failed for pod {pod}: {reason}")]
    Logs { pod: String, reason: String },

    /// The platform CLI could not be executed at all.
    #[error("failed to run {tool}: {reason}")]
    Exec { tool: String, reason: String },

    /// The platform answered with something we could not parse.
    #[error("unexpected platform response: {0}")]
    Parse(String),
}
