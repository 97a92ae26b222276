//! Workflow configuration.
//!
//! One explicit value carries everything a workflow run needs — no
//! process-wide mutable configuration. Built from CLI flags; the
//! defaults describe the messaging-app deployment this tool grew up
//! around.

use std::path::PathBuf;
use std::time::Duration;

use cutover_platform::{Color, DeploymentTarget};

/// Everything one workflow run needs to know. Immutable once built.
#[derive(Debug, Clone)]
pub struct CutoverConfig {
    pub namespace: String,
    /// Value of the `app` label shared by all deployments of the service.
    pub app_label: String,
    /// The service whose selector routes live traffic.
    pub service: String,
    pub blue_manifest: PathBuf,
    pub green_manifest: PathBuf,
    /// Service/ingress definitions applied alongside the deployments.
    pub service_manifest: PathBuf,
    /// Deployment driven by rolling updates (no color).
    pub rolling_deployment: String,
    pub rolling_manifest: PathBuf,
    pub desired_replicas: u32,
    /// Budget for one readiness wait.
    pub readiness_timeout: Duration,
    /// Pause between readiness polls.
    pub poll_interval: Duration,
    pub log_tail_lines: u32,
    /// `host:port` of the stable service endpoint users hit.
    pub endpoint: String,
    pub probe_path: String,
    pub probe_fallback_path: Option<String>,
    pub probe_timeout: Duration,
    pub monitor_interval: Duration,
    /// How long the rolling workflow waits for the first successful probe.
    pub baseline_timeout: Duration,
}

impl Default for CutoverConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            app_label: "messaging-app".to_string(),
            service: "messaging-app-service".to_string(),
            blue_manifest: PathBuf::from("blue_deployment.yaml"),
            green_manifest: PathBuf::from("green_deployment.yaml"),
            service_manifest: PathBuf::from("kubeservice.yaml"),
            rolling_deployment: "messaging-app-blue".to_string(),
            rolling_manifest: PathBuf::from("blue_deployment.yaml"),
            desired_replicas: 3,
            readiness_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            log_tail_lines: 50,
            endpoint: "localhost:8000".to_string(),
            probe_path: "/".to_string(),
            probe_fallback_path: Some("/api/".to_string()),
            probe_timeout: Duration::from_secs(5),
            monitor_interval: Duration::from_secs(2),
            baseline_timeout: Duration::from_secs(30),
        }
    }
}

impl CutoverConfig {
    /// One colored side of the blue/green pair.
    pub fn target(&self, color: Color) -> DeploymentTarget {
        let manifest = match color {
            Color::Blue => self.blue_manifest.clone(),
            Color::Green => self.green_manifest.clone(),
        };
        DeploymentTarget::new(
            &format!("{}-{}", self.app_label, color),
            &self.namespace,
            manifest,
            self.desired_replicas,
            &self.app_label,
            Some(color),
        )
    }

    /// The single deployment a rolling update drives in place.
    pub fn rolling_target(&self) -> DeploymentTarget {
        DeploymentTarget::new(
            &self.rolling_deployment,
            &self.namespace,
            self.rolling_manifest.clone(),
            self.desired_replicas,
            &self.app_label,
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colored_targets_derive_names_and_manifests() {
        let cfg = CutoverConfig::default();
        let blue = cfg.target(Color::Blue);
        assert_eq!(blue.name, "messaging-app-blue");
        assert_eq!(blue.manifest, PathBuf::from("blue_deployment.yaml"));
        assert_eq!(blue.labels.get("version").unwrap(), "blue");

        let green = cfg.target(Color::Green);
        assert_eq!(green.name, "messaging-app-green");
        assert_eq!(green.labels.get("version").unwrap(), "green");
    }

    #[test]
    fn rolling_target_has_no_color() {
        let cfg = CutoverConfig::default();
        let target = cfg.rolling_target();
        assert_eq!(target.color, None);
        assert!(!target.labels.contains_key("version"));
    }
}
