//! End-to-end workflow tests against the in-memory platform.

use std::time::Duration;

use cutover_flow::{CutoverConfig, FlowError, run_full_deploy};
use cutover_platform::{Color, DeploymentStatus, FakePlatform, PlatformClient, Selector};

fn fast_cfg() -> CutoverConfig {
    CutoverConfig {
        poll_interval: Duration::from_millis(1),
        readiness_timeout: Duration::from_millis(50),
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

/// A cluster where blue is already live behind the service.
fn seeded_platform(cfg: &CutoverConfig) -> FakePlatform {
    let platform = FakePlatform::new();
    let blue = cfg.target(Color::Blue);
    let green = cfg.target(Color::Green);

    platform.register_manifest(cfg.blue_manifest.clone(), &blue.name, &cfg.namespace, ready(3), 0);
    platform.register_manifest(
        cfg.green_manifest.clone(),
        &green.name,
        &cfg.namespace,
        ready(3),
        0,
    );
    platform.register_inert_manifest(cfg.service_manifest.clone());
    platform.insert_service(&cfg.service, &cfg.namespace, blue.labels.clone());
    platform
}

async fn live_version(platform: &FakePlatform, cfg: &CutoverConfig) -> String {
    platform
        .service_selector(&cfg.service, &cfg.namespace)
        .await
        .unwrap()
        .get("version")
        .cloned()
        .unwrap_or_default()
}

fn pod_labels(cfg: &CutoverConfig, color: Color) -> Selector {
    cfg.target(color).labels
}

#[tokio::test]
async fn full_deploy_switches_traffic_to_green() {
    let cfg = fast_cfg();
    let platform = seeded_platform(&cfg);
    platform.insert_pod(
        "green-1",
        &cfg.namespace,
        pod_labels(&cfg, Color::Green),
        "Booted worker 1\nReady to accept connections",
    );

    run_full_deploy(&platform, &cfg).await.unwrap();

    assert_eq!(live_version(&platform, &cfg).await, "green");
    // Both deployment manifests and the service manifest were applied.
    assert_eq!(platform.applied().len(), 3);
}

#[tokio::test]
async fn green_traceback_keeps_traffic_on_blue() {
    let cfg = fast_cfg();
    let platform = seeded_platform(&cfg);
    platform.insert_pod(
        "green-1",
        &cfg.namespace,
        pod_labels(&cfg, Color::Green),
        "Starting\nTraceback (most recent call last)\n  File \"app.py\", line 3",
    );

    let err = run_full_deploy(&platform, &cfg).await.unwrap_err();
    assert!(matches!(err, FlowError::LogSignatures { .. }));

    // Green is deployed but unrouted; no selector patch was attempted.
    assert_eq!(live_version(&platform, &cfg).await, "blue");
    assert_eq!(platform.patch_attempts(), 0);
    assert!(
        platform
            .deployment("messaging-app-green", &cfg.namespace)
            .is_some()
    );
}

#[tokio::test]
async fn blue_log_errors_do_not_stop_the_cutover() {
    let cfg = fast_cfg();
    let platform = seeded_platform(&cfg);
    platform.insert_pod(
        "blue-1",
        &cfg.namespace,
        pod_labels(&cfg, Color::Blue),
        "ERROR old incident, already serving",
    );
    platform.insert_pod(
        "green-1",
        &cfg.namespace,
        pod_labels(&cfg, Color::Green),
        "clean boot",
    );

    run_full_deploy(&platform, &cfg).await.unwrap();
    assert_eq!(live_version(&platform, &cfg).await, "green");
}

#[tokio::test]
async fn green_readiness_timeout_aborts_without_patch() {
    let cfg = fast_cfg();
    let platform = seeded_platform(&cfg);
    // Green never reports Available within the budget.
    platform.register_manifest(
        cfg.green_manifest.clone(),
        "messaging-app-green",
        &cfg.namespace,
        ready(3),
        10_000,
    );

    let err = run_full_deploy(&platform, &cfg).await.unwrap_err();
    assert!(matches!(err, FlowError::ReadinessTimeout { .. }));
    assert_eq!(live_version(&platform, &cfg).await, "blue");
    assert_eq!(platform.patch_attempts(), 0);
}

#[tokio::test]
async fn rejected_blue_manifest_aborts_first() {
    let cfg = fast_cfg();
    let platform = FakePlatform::new();
    platform.reject_manifest(cfg.blue_manifest.clone(), "unknown field replicaz");

    let err = run_full_deploy(&platform, &cfg).await.unwrap_err();
    assert!(matches!(err, FlowError::Apply { .. }));
    assert!(platform.applied().is_empty());
}

#[tokio::test]
async fn unreachable_green_pod_does_not_block_cutover() {
    let cfg = fast_cfg();
    let platform = seeded_platform(&cfg);
    platform.insert_pod(
        "green-1",
        &cfg.namespace,
        pod_labels(&cfg, Color::Green),
        "clean",
    );
    platform.insert_unreachable_pod("green-2", &cfg.namespace, pod_labels(&cfg, Color::Green));

    // One pod's logs are unavailable: a warning, not an abort.
    run_full_deploy(&platform, &cfg).await.unwrap();
    assert_eq!(live_version(&platform, &cfg).await, "green");
}
