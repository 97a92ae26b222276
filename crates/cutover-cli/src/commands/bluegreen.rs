//! Blue/green subcommands.

use anyhow::bail;
use cutover_flow::{
    CutoverConfig, apply_manifest, run_full_deploy, scan_logs, switch_to, wait_ready,
};
use cutover_platform::{Color, DeploymentTarget, PlatformClient};

/// Deploy one color and wait for readiness.
pub async fn deploy<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
    color: Color,
) -> anyhow::Result<()> {
    let target = cfg.target(color);
    apply_manifest(platform, &target.manifest).await?;
    let result = wait_ready(platform, &target, cfg.readiness_timeout, cfg.poll_interval).await?;
    println!(
        "✓ {} ready after {:.1}s",
        target.name,
        result.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Point the service at one color.
pub async fn switch<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
    color: Color,
) -> anyhow::Result<()> {
    let target = cfg.target(color);
    switch_to(platform, &cfg.service, &target).await?;
    println!("✓ {} now routes to {color}", cfg.service);
    Ok(())
}

/// Scan logs of one deployment, or of both colors.
pub async fn check_logs<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
    deployment: Option<&str>,
) -> anyhow::Result<()> {
    let targets: Vec<DeploymentTarget> = match deployment {
        Some(name) => vec![DeploymentTarget::new(
            name,
            &cfg.namespace,
            std::path::PathBuf::new(),
            cfg.desired_replicas,
            &cfg.app_label,
            None,
        )],
        None => vec![cfg.target(Color::Blue), cfg.target(Color::Green)],
    };

    let mut dirty = false;
    for target in &targets {
        let scan = scan_logs(platform, target, cfg.log_tail_lines).await?;
        println!(
            "{}: {} pods, {} with error signatures",
            target.name,
            scan.pods.len(),
            scan.matches.len()
        );
        for (pod, lines) in &scan.matches {
            dirty = true;
            for line in lines {
                println!("  {pod}: {line}");
            }
        }
        for pod in &scan.warnings {
            println!("  warning: logs unavailable for {pod}");
        }
    }

    if dirty {
        bail!("error signatures found");
    }
    println!("✓ logs clean");
    Ok(())
}

/// Readiness per color plus which color is live.
pub async fn status<P: PlatformClient>(platform: &P, cfg: &CutoverConfig) -> anyhow::Result<()> {
    for color in [Color::Blue, Color::Green] {
        let target = cfg.target(color);
        match platform
            .deployment_status(&target.name, &target.namespace)
            .await
        {
            Ok(s) => println!(
                "{}: {}/{} ready, available={}",
                target.name, s.ready_replicas, s.desired_replicas, s.available
            ),
            Err(e) => println!("{}: {e}", target.name),
        }
    }

    match platform.service_selector(&cfg.service, &cfg.namespace).await {
        Ok(selector) => {
            let live = selector
                .get("version")
                .cloned()
                .unwrap_or_else(|| "unknown".to_string());
            println!("{}: routing to {live}", cfg.service);
        }
        Err(e) => println!("{}: {e}", cfg.service),
    }
    Ok(())
}

/// The whole cutover. On abort, report the traffic state so the operator
/// knows whether rollback is needed.
pub async fn full_deploy<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
) -> anyhow::Result<()> {
    match run_full_deploy(platform, cfg).await {
        Ok(()) => {
            println!("✓ cutover complete, green is live");
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ cutover aborted: {e}");
            report_traffic_state(platform, cfg).await;
            Err(e.into())
        }
    }
}

/// Best-effort: show where traffic currently points.
async fn report_traffic_state<P: PlatformClient>(platform: &P, cfg: &CutoverConfig) {
    match platform.service_selector(&cfg.service, &cfg.namespace).await {
        Ok(selector) => {
            let live = selector.get("version").cloned().unwrap_or_default();
            eprintln!("  traffic state: {} still routes to {live}", cfg.service);
        }
        Err(e) => eprintln!("  traffic state unknown: {e}"),
    }
}
