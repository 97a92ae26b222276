//! Single-deployment operations: apply, readiness wait, replica verify.

use std::path::Path;
use std::time::{Duration, Instant};

use cutover_platform::{DeploymentStatus, DeploymentTarget, PlatformClient, PlatformError};
use tracing::{debug, info};

use crate::error::FlowError;

/// Outcome of one readiness wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessResult {
    pub deployment: String,
    pub ready: bool,
    pub elapsed: Duration,
}

/// Submit a manifest. Fatal on rejection — a malformed manifest fails
/// identically on retry.
pub async fn apply_manifest<P: PlatformClient>(
    platform: &P,
    manifest: &Path,
) -> Result<(), FlowError> {
    info!(manifest = %manifest.display(), "applying manifest");
    platform.apply_manifest(manifest).await.map_err(|e| match e {
        PlatformError::Rejected(reason) => FlowError::Apply {
            manifest: manifest.to_path_buf(),
            reason,
        },
        other => FlowError::Apply {
            manifest: manifest.to_path_buf(),
            reason: other.to_string(),
        },
    })
}

/// Poll until the deployment reports the platform's Available condition,
/// or `timeout` elapses.
///
/// Polls are spaced by `poll_interval` (never tighter than 1s against a
/// real control plane); the first poll is immediate. On timeout the
/// error carries the elapsed time and the last replica snapshot.
pub async fn wait_ready<P: PlatformClient>(
    platform: &P,
    target: &DeploymentTarget,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ReadinessResult, FlowError> {
    let started = Instant::now();
    let mut last: Option<DeploymentStatus> = None;

    loop {
        let status = platform
            .deployment_status(&target.name, &target.namespace)
            .await?;
        // The Available condition is what "rollout done" means to the
        // platform. Replica parity is checked separately by `verify`.
        if status.available {
            let elapsed = started.elapsed();
            info!(
                deployment = %target.name,
                ready = status.ready_replicas,
                elapsed_secs = elapsed.as_secs(),
                "deployment ready"
            );
            return Ok(ReadinessResult {
                deployment: target.name.clone(),
                ready: true,
                elapsed,
            });
        }

        debug!(
            deployment = %target.name,
            ready = status.ready_replicas,
            desired = status.desired_replicas,
            "waiting for readiness"
        );
        last = Some(status);

        if started.elapsed() + poll_interval > timeout {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    let snapshot = last.unwrap_or_default();
    Err(FlowError::ReadinessTimeout {
        deployment: target.name.clone(),
        elapsed: started.elapsed(),
        ready: snapshot.ready_replicas,
        desired: snapshot.desired_replicas,
    })
}

/// Replica-parity check: ready equals desired and both are positive.
///
/// Independent of (and authoritative over) any rollout-status success
/// the platform reported.
pub async fn verify_replicas<P: PlatformClient>(
    platform: &P,
    target: &DeploymentTarget,
) -> Result<DeploymentStatus, FlowError> {
    let status = platform
        .deployment_status(&target.name, &target.namespace)
        .await?;
    if !status.at_parity() {
        return Err(FlowError::ReplicaParity {
            deployment: target.name.clone(),
            ready: status.ready_replicas,
            desired: status.desired_replicas,
        });
    }
    info!(
        deployment = %target.name,
        replicas = status.ready_replicas,
        "replica parity verified"
    );
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutover_platform::{Color, FakePlatform};
    use std::path::PathBuf;

    fn target(color: Option<Color>) -> DeploymentTarget {
        DeploymentTarget::new(
            "app-blue",
            "default",
            PathBuf::from("blue.yaml"),
            3,
            "app",
            color,
        )
    }

    fn ready(replicas: u32) -> DeploymentStatus {
        DeploymentStatus {
            desired_replicas: replicas,
            ready_replicas: replicas,
            available: true,
        }
    }

    #[tokio::test]
    async fn apply_rejection_is_fatal() {
        let platform = FakePlatform::new();
        platform.reject_manifest("bad.yaml", "schema violation");
        let err = apply_manifest(&platform, Path::new("bad.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Apply { .. }));
    }

    #[tokio::test]
    async fn wait_ready_succeeds_after_polls() {
        let platform = FakePlatform::new();
        platform.register_manifest("blue.yaml", "app-blue", "default", ready(3), 2);
        platform
            .apply_manifest(Path::new("blue.yaml"))
            .await
            .unwrap();

        let result = wait_ready(
            &platform,
            &target(Some(Color::Blue)),
            Duration::from_secs(5),
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        assert!(result.ready);
        assert_eq!(result.deployment, "app-blue");
    }

    #[tokio::test]
    async fn wait_ready_times_out_with_replica_snapshot() {
        let platform = FakePlatform::new();
        // Never becomes ready within the single allowed poll.
        platform.register_manifest("blue.yaml", "app-blue", "default", ready(3), 100);
        platform
            .apply_manifest(Path::new("blue.yaml"))
            .await
            .unwrap();

        let err = wait_ready(
            &platform,
            &target(Some(Color::Blue)),
            Duration::from_millis(10),
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();

        match err {
            FlowError::ReadinessTimeout { ready, desired, .. } => {
                assert_eq!(ready, 0);
                assert_eq!(desired, 3);
            }
            other => panic!("expected ReadinessTimeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn verify_fails_below_parity() {
        let platform = FakePlatform::new();
        platform.register_manifest(
            "blue.yaml",
            "app-blue",
            "default",
            DeploymentStatus {
                desired_replicas: 3,
                ready_replicas: 2,
                available: true,
            },
            0,
        );
        platform
            .apply_manifest(Path::new("blue.yaml"))
            .await
            .unwrap();

        let err = verify_replicas(&platform, &target(None)).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::ReplicaParity {
                ready: 2,
                desired: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn verify_rejects_zero_desired() {
        let platform = FakePlatform::new();
        platform.register_manifest("blue.yaml", "app-blue", "default", ready(0), 0);
        platform
            .apply_manifest(Path::new("blue.yaml"))
            .await
            .unwrap();

        // 0/0 is numerically equal but never success.
        let err = verify_replicas(&platform, &target(None)).await.unwrap_err();
        assert!(matches!(err, FlowError::ReplicaParity { .. }));
    }
}
