//! Traffic switch: one atomic selector patch.
//!
//! The service selector is a single-writer resource for the duration of
//! a workflow run; this is the only place it is mutated. Established
//! connections are untouched — the patch only changes where new
//! connections resolve. No rollback is attempted here; that decision
//! belongs to the workflow.

use cutover_platform::{DeploymentTarget, PlatformClient};
use tracing::info;

use crate::error::FlowError;

/// Point `service` at `target`'s pods.
pub async fn switch_to<P: PlatformClient>(
    platform: &P,
    service: &str,
    target: &DeploymentTarget,
) -> Result<(), FlowError> {
    platform
        .patch_service_selector(service, &target.namespace, &target.labels)
        .await
        .map_err(|e| FlowError::Switch {
            service: service.to_string(),
            reason: e.to_string(),
        })?;

    info!(
        %service,
        deployment = %target.name,
        color = ?target.color,
        "traffic switched"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutover_platform::{Color, FakePlatform, Selector};
    use std::path::PathBuf;

    fn labels(pairs: &[(&str, &str)]) -> Selector {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn green() -> DeploymentTarget {
        DeploymentTarget::new(
            "app-green",
            "default",
            PathBuf::from("green.yaml"),
            2,
            "app",
            Some(Color::Green),
        )
    }

    #[tokio::test]
    async fn switch_repoints_selector() {
        let platform = FakePlatform::new();
        platform.insert_service(
            "svc",
            "default",
            labels(&[("app", "app"), ("version", "blue")]),
        );

        switch_to(&platform, "svc", &green()).await.unwrap();

        let selector = platform.service_selector("svc", "default").await.unwrap();
        assert_eq!(selector.get("version").unwrap(), "green");
    }

    #[tokio::test]
    async fn missing_service_is_a_switch_error() {
        let platform = FakePlatform::new();
        let err = switch_to(&platform, "missing", &green()).await.unwrap_err();
        assert!(matches!(err, FlowError::Switch { .. }));
    }
}
