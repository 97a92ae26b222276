//! Monitor-only subcommands.

use std::path::Path;
use std::time::Duration;

use anyhow::bail;
use cutover_health::{HttpProber, MonitorConfig, MonitorRun, ProbeLog, start};
use tracing::warn;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const FALLBACK_PATH: &str = "/api/";

async fn run(
    endpoint: &str,
    interval: Duration,
    max_probes: u64,
    log_dir: &Path,
) -> MonitorRun {
    let prober = HttpProber::new(endpoint, "/", Some(FALLBACK_PATH), PROBE_TIMEOUT);
    let probe_log = match ProbeLog::create(log_dir) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!(error = %e, "could not create probe log file");
            None
        }
    };

    let handle = start(
        prober,
        MonitorConfig {
            interval,
            max_probes: Some(max_probes),
        },
        probe_log,
    );
    handle.join().await
}

/// Probe the endpoint `max_probes` times and report statistics.
pub async fn monitor_only(
    endpoint: &str,
    interval: Duration,
    max_probes: u64,
    log_dir: &Path,
) -> anyhow::Result<()> {
    let run = run(endpoint, interval, max_probes, log_dir).await;
    println!("{}", run.summary());
    if let Some(path) = &run.log_path {
        println!("probe log: {}", path.display());
    }
    Ok(())
}

/// Like `monitor_only`, but any failed probe fails the command, so CI
/// can gate on zero downtime.
pub async fn downtime_test(
    endpoint: &str,
    interval: Duration,
    max_probes: u64,
    log_dir: &Path,
) -> anyhow::Result<()> {
    let monitor_run = run(endpoint, interval, max_probes, log_dir).await;
    let summary = monitor_run.summary();
    println!("{summary}");
    if let Some(path) = &monitor_run.log_path {
        println!("probe log: {}", path.display());
    }

    if summary.failed_probes > 0 {
        bail!(
            "downtime detected: {} of {} probes failed ({:.1}%)",
            summary.failed_probes,
            summary.total_probes,
            summary.downtime_pct
        );
    }
    println!("✓ no downtime detected");
    Ok(())
}
