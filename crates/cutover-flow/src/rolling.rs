//! Rolling update under concurrent endpoint supervision.
//!
//! Two tasks run together: the foreground apply sequence
//! (apply → annotate change-cause → wait for rollout → verify replica
//! parity) and the background health monitor probing the stable service
//! endpoint. The monitor's first successful probe must land before the
//! apply is issued — without that baseline, a failure during the update
//! cannot be told apart from "the service was never reachable". The
//! monitor is stopped and its summary produced on every exit path.

use cutover_health::{MonitorConfig, MonitorSummary, ProbeLog, Prober, start};
use cutover_platform::{DeploymentStatus, PlatformClient};
use tracing::{info, warn};

use crate::config::CutoverConfig;
use crate::error::FlowError;
use crate::steps::{apply_manifest, verify_replicas, wait_ready};

/// Annotation recorded on every rolling update.
const CHANGE_CAUSE: &str = "kubernetes.io/change-cause";

/// What a supervised rolling update produced. The summary and probe log
/// exist on every exit path, success or abort.
#[derive(Debug)]
pub struct RollingReport {
    pub summary: MonitorSummary,
    pub probe_log: Option<std::path::PathBuf>,
    pub outcome: Result<DeploymentStatus, FlowError>,
}

/// The foreground apply sequence, without supervision. Also exposed as
/// the `apply-only` subcommand.
pub async fn rolling_apply<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
) -> Result<DeploymentStatus, FlowError> {
    let target = cfg.rolling_target();

    apply_manifest(platform, &target.manifest).await?;

    let cause = format!(
        "cutover rolling update at {}",
        chrono::Utc::now().to_rfc3339()
    );
    if let Err(e) = platform
        .annotate_deployment(&target.name, &target.namespace, CHANGE_CAUSE, &cause)
        .await
    {
        // Change-cause is bookkeeping; the rollout itself decides success.
        warn!(error = %e, "could not record change-cause annotation");
    }

    wait_ready(platform, &target, cfg.readiness_timeout, cfg.poll_interval).await?;
    verify_replicas(platform, &target).await
}

/// Run a rolling update supervised by the endpoint monitor.
///
/// Infallible by construction: whatever happens to the apply sequence,
/// the monitor is stopped, its ledger is summarized, and the report
/// carries the typed outcome.
pub async fn run_rolling_update<P, B>(
    platform: &P,
    prober: B,
    cfg: &CutoverConfig,
    probe_log: Option<ProbeLog>,
) -> RollingReport
where
    P: PlatformClient,
    B: Prober + 'static,
{
    let mut monitor = start(
        prober,
        MonitorConfig {
            interval: cfg.monitor_interval,
            max_probes: None,
        },
        probe_log,
    );

    info!(endpoint = %cfg.endpoint, "waiting for baseline reachability");
    if !monitor.wait_baseline(cfg.baseline_timeout).await {
        let run = monitor.stop().await;
        return RollingReport {
            summary: run.summary(),
            probe_log: run.log_path,
            outcome: Err(FlowError::BaselineUnreachable {
                timeout: cfg.baseline_timeout,
            }),
        };
    }

    let outcome = rolling_apply(platform, cfg).await;

    // Guaranteed stop: this runs on success and on every abort path.
    let run = monitor.stop().await;
    let summary = run.summary();
    info!(
        probes = summary.total_probes,
        failed = summary.failed_probes,
        downtime_pct = summary.downtime_pct,
        "rolling update monitor summary"
    );

    RollingReport {
        summary,
        probe_log: run.log_path,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutover_health::ProbeOutcome;
    use cutover_platform::FakePlatform;
    use std::path::Path;
    use std::time::Duration;

    /// Always-up prober.
    struct UpProber;
    impl Prober for UpProber {
        async fn probe(&self) -> ProbeOutcome {
            ProbeOutcome::Up {
                status: 200,
                fell_back: false,
            }
        }
    }

    /// Never-up prober.
    struct DownProber;
    impl Prober for DownProber {
        async fn probe(&self) -> ProbeOutcome {
            ProbeOutcome::Down {
                cause: "connection refused".to_string(),
            }
        }
    }

    fn fast_cfg() -> CutoverConfig {
        CutoverConfig {
            poll_interval: Duration::from_millis(1),
            readiness_timeout: Duration::from_millis(100),
            monitor_interval: Duration::from_millis(1),
            baseline_timeout: Duration::from_millis(100),
            ..CutoverConfig::default()
        }
    }

    fn ready(replicas: u32) -> DeploymentStatus {
        DeploymentStatus {
            desired_replicas: replicas,
            ready_replicas: replicas,
            available: true,
        }
    }

    #[tokio::test]
    async fn rolling_update_succeeds_with_reachable_endpoint() {
        let cfg = fast_cfg();
        let platform = FakePlatform::new();
        platform.register_manifest(
            cfg.rolling_manifest.clone(),
            &cfg.rolling_deployment,
            &cfg.namespace,
            ready(3),
            0,
        );

        let report = run_rolling_update(&platform, UpProber, &cfg, None).await;
        let status = report.outcome.unwrap();
        assert_eq!(status.ready_replicas, 3);
        assert!(report.summary.total_probes >= 1);
        assert_eq!(report.summary.failed_probes, 0);
        // Change-cause was recorded.
        assert!(
            platform
                .annotation(&cfg.rolling_deployment, &cfg.namespace, CHANGE_CAUSE)
                .is_some()
        );
    }

    #[tokio::test]
    async fn unreachable_baseline_aborts_before_apply() {
        let cfg = fast_cfg();
        let platform = FakePlatform::new();
        platform.register_manifest(
            cfg.rolling_manifest.clone(),
            &cfg.rolling_deployment,
            &cfg.namespace,
            ready(3),
            0,
        );

        let report = run_rolling_update(&platform, DownProber, &cfg, None).await;
        assert!(matches!(
            report.outcome,
            Err(FlowError::BaselineUnreachable { .. })
        ));
        // Nothing was applied: the failure is attributable to the
        // endpoint, not the update.
        assert!(platform.applied().is_empty());
        assert!(report.summary.failed_probes > 0);
    }

    #[tokio::test]
    async fn monitor_is_stopped_when_apply_fails() {
        let cfg = fast_cfg();
        let platform = FakePlatform::new();
        platform.reject_manifest(cfg.rolling_manifest.clone(), "bad image reference");

        let report = run_rolling_update(&platform, UpProber, &cfg, None).await;
        assert!(matches!(report.outcome, Err(FlowError::Apply { .. })));
        // The summary exists, which means the monitor was joined.
        assert!(report.summary.total_probes >= 1);
    }

    #[tokio::test]
    async fn parity_failure_is_authoritative() {
        let cfg = fast_cfg();
        let platform = FakePlatform::new();
        // Available with 2/3 ready: rollout "looks" done, parity says no.
        platform.register_manifest(
            cfg.rolling_manifest.clone(),
            &cfg.rolling_deployment,
            &cfg.namespace,
            DeploymentStatus {
                desired_replicas: 3,
                ready_replicas: 2,
                available: true,
            },
            0,
        );

        let report = run_rolling_update(&platform, UpProber, &cfg, None).await;
        match report.outcome {
            Err(FlowError::ReplicaParity { ready, desired, .. }) => {
                assert_eq!((ready, desired), (2, 3));
            }
            other => panic!("expected replica parity failure at 2/3, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn apply_only_verifies_parity() {
        let cfg = fast_cfg();
        let platform = FakePlatform::new();
        platform.register_manifest(
            cfg.rolling_manifest.clone(),
            &cfg.rolling_deployment,
            &cfg.namespace,
            ready(3),
            1,
        );

        let status = rolling_apply(&platform, &cfg).await.unwrap();
        assert!(status.at_parity());
        assert_eq!(platform.applied(), vec![Path::new("blue_deployment.yaml")]);
    }
}
