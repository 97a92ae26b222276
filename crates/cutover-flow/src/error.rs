//! Workflow abort taxonomy.

use std::path::PathBuf;
use std::time::Duration;

use cutover_platform::PlatformError;
use thiserror::Error;

/// Why a workflow aborted. Each variant carries enough for the operator
/// to judge whether rollback is needed.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The platform rejected a manifest. Retrying would fail
    /// identically.
    #[error("manifest {} rejected: {reason}", .manifest.display())]
    Apply { manifest: PathBuf, reason: String },

    /// Readiness was not reached within budget. Usually a bad image or
    /// resource starvation; not auto-retried.
    #[error(
        "deployment {deployment} not ready after {elapsed:.1?} \
         ({ready}/{desired} replicas ready)"
    )]
    ReadinessTimeout {
        deployment: String,
        elapsed: Duration,
        ready: u32,
        desired: u32,
    },

    /// Error signatures found in a deployment's own logs. Fatal only when
    /// the deployment is the new side of a cutover.
    #[error("error signatures in logs of {deployment} (pods: {})", .pods.join(", "))]
    LogSignatures {
        deployment: String,
        pods: Vec<String>,
    },

    /// The selector patch was rejected. Traffic state is unchanged.
    #[error("traffic switch for service {service} failed: {reason}")]
    Switch { service: String, reason: String },

    /// `readyReplicas` did not match a positive desired count after a
    /// rollout reported success.
    #[error("replica parity failed for {deployment}: {ready}/{desired} ready")]
    ReplicaParity {
        deployment: String,
        ready: u32,
        desired: u32,
    },

    /// The service endpoint never answered a probe before the rolling
    /// update would have started, so failures could not be told apart
    /// from "never reachable".
    #[error("no successful baseline probe within {timeout:?}")]
    BaselineUnreachable { timeout: Duration },

    /// Any other platform failure.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
