//! The platform-client trait.
//!
//! This is the only seam between the workflows and the cluster. Keeping
//! it narrow (apply / get / patch / logs / annotate) keeps the workflow
//! crates testable against [`crate::FakePlatform`].

use std::path::Path;

use crate::error::PlatformResult;
use crate::types::{DeploymentStatus, Selector};

/// Operations the orchestrator needs from the platform control plane.
///
/// All operations are point-in-time: none of them wait for readiness.
/// Waiting and retry policy belong to the workflow layer.
pub trait PlatformClient: Send + Sync {
    /// Submit a declarative manifest. Returns once the platform has
    /// *accepted* it, not once the result is ready. Idempotent:
    /// re-applying an identical manifest is a no-op.
    fn apply_manifest(
        &self,
        manifest: &Path,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    /// Read a deployment's replica counts and "Available" condition.
    fn deployment_status(
        &self,
        name: &str,
        namespace: &str,
    ) -> impl Future<Output = PlatformResult<DeploymentStatus>> + Send;

    /// Record an annotation on a deployment (e.g. a change-cause).
    fn annotate_deployment(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = PlatformResult<()>> + Send;

    /// Names of pods matching a label selector, in platform order.
    fn pods_matching(
        &self,
        selector: &Selector,
        namespace: &str,
    ) -> impl Future<Output = PlatformResult<Vec<String>>> + Send;

    /// The last `tail_lines` lines of one pod's log output.
    fn pod_logs(
        &self,
        pod: &str,
        namespace: &str,
        tail_lines: u32,
    ) -> impl Future<Output = PlatformResult<String>> + Send;

    /// A service's current pod selector.
    fn service_selector(
        &self,
        service: &str,
        namespace: &str,
    ) -> impl Future<Output = PlatformResult<Selector>> + Send;

    /// Atomically rewrite a service's pod selector. Existing connections
    /// are untouched; new connections resolve to the new selector as soon
    /// as the patch commits.
    fn patch_service_selector(
        &self,
        service: &str,
        namespace: &str,
        selector: &Selector,
    ) -> impl Future<Output = PlatformResult<()>> + Send;
}
