//! Rolling-update subcommands.

use std::path::Path;

use cutover_flow::{CutoverConfig, rolling_apply, run_rolling_update, verify_replicas};
use cutover_health::{HttpProber, ProbeLog};
use cutover_platform::PlatformClient;
use tracing::warn;

/// Supervised rolling update: monitor + apply sequence.
pub async fn rolling_update<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
    log_dir: &Path,
) -> anyhow::Result<()> {
    let prober = HttpProber::new(
        &cfg.endpoint,
        &cfg.probe_path,
        cfg.probe_fallback_path.as_deref(),
        cfg.probe_timeout,
    );
    let probe_log = match ProbeLog::create(log_dir) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!(error = %e, "could not create probe log file");
            None
        }
    };

    let report = run_rolling_update(platform, prober, cfg, probe_log).await;

    println!("--- monitor summary ---");
    println!("{}", report.summary);
    if let Some(path) = &report.probe_log {
        println!("probe log: {}", path.display());
    }

    match report.outcome {
        Ok(status) => {
            println!(
                "✓ rolling update complete: {}/{} replicas ready",
                status.ready_replicas, status.desired_replicas
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ rolling update aborted: {e}");
            Err(e.into())
        }
    }
}

/// Apply sequence without the monitor.
pub async fn apply_only<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
) -> anyhow::Result<()> {
    let status = rolling_apply(platform, cfg).await?;
    println!(
        "✓ {} rolled out: {}/{} replicas ready",
        cfg.rolling_deployment, status.ready_replicas, status.desired_replicas
    );
    Ok(())
}

/// Replica-parity check only.
pub async fn verify_only<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
) -> anyhow::Result<()> {
    let target = cfg.rolling_target();
    let status = verify_replicas(platform, &target).await?;
    println!(
        "✓ {}: {}/{} replicas ready",
        target.name, status.ready_replicas, status.desired_replicas
    );
    Ok(())
}
