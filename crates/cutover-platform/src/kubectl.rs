//! Real platform client: shells out to `kubectl`.
//!
//! Every operation is one `kubectl` invocation with captured output.
//! Reads use `-o json` and are parsed into typed partial structs — only
//! the fields the workflows consume are deserialized.
//!
//! Binary resolution order:
//! 1. `$CUTOVER_KUBECTL` environment variable
//! 2. `kubectl` on `$PATH`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::client::PlatformClient;
use crate::error::{PlatformError, PlatformResult};
use crate::types::{DeploymentStatus, Selector, selector_string};

/// Platform client backed by the `kubectl` CLI.
#[derive(Debug, Clone)]
pub struct KubectlClient {
    bin: PathBuf,
}

impl KubectlClient {
    /// Resolve the `kubectl` binary from `$CUTOVER_KUBECTL` or `$PATH`.
    pub fn new() -> Self {
        let bin = std::env::var("CUTOVER_KUBECTL")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("kubectl"));
        Self { bin }
    }

    /// Use an explicit binary path (tests, unusual installs).
    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Run one kubectl invocation and return stdout.
    ///
    /// A non-zero exit maps to the error produced by `classify`, carrying
    /// trimmed stderr.
    async fn run(
        &self,
        args: &[&str],
        classify: impl FnOnce(String) -> PlatformError,
    ) -> PlatformResult<String> {
        debug!(bin = %self.bin.display(), ?args, "kubectl");
        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| PlatformError::Exec {
                tool: self.bin.display().to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("NotFound") || stderr.contains("not found") {
                return Err(PlatformError::NotFound(stderr));
            }
            return Err(classify(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for KubectlClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformClient for KubectlClient {
    async fn apply_manifest(&self, manifest: &Path) -> PlatformResult<()> {
        let path = manifest.display().to_string();
        self.run(&["apply", "-f", &path], PlatformError::Rejected)
            .await?;
        Ok(())
    }

    async fn deployment_status(
        &self,
        name: &str,
        namespace: &str,
    ) -> PlatformResult<DeploymentStatus> {
        let json = self
            .run(
                &["get", "deployment", name, "-n", namespace, "-o", "json"],
                PlatformError::Rejected,
            )
            .await?;
        parse_deployment_status(&json)
    }

    async fn annotate_deployment(
        &self,
        name: &str,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> PlatformResult<()> {
        let pair = format!("{key}={value}");
        self.run(
            &[
                "annotate",
                "deployment",
                name,
                &pair,
                "-n",
                namespace,
                "--overwrite",
            ],
            PlatformError::Rejected,
        )
        .await?;
        Ok(())
    }

    async fn pods_matching(
        &self,
        selector: &Selector,
        namespace: &str,
    ) -> PlatformResult<Vec<String>> {
        let label = selector_string(selector);
        let json = self
            .run(
                &["get", "pods", "-n", namespace, "-l", &label, "-o", "json"],
                PlatformError::Rejected,
            )
            .await?;
        parse_pod_names(&json)
    }

    async fn pod_logs(
        &self,
        pod: &str,
        namespace: &str,
        tail_lines: u32,
    ) -> PlatformResult<String> {
        let tail = format!("--tail={tail_lines}");
        self.run(&["logs", pod, "-n", namespace, &tail], |stderr| {
            PlatformError::Logs {
                pod: pod.to_string(),
                reason: stderr,
            }
        })
        .await
    }

    async fn service_selector(&self, service: &str, namespace: &str) -> PlatformResult<Selector> {
        let json = self
            .run(
                &["get", "service", service, "-n", namespace, "-o", "json"],
                PlatformError::Rejected,
            )
            .await?;
        parse_service_selector(&json)
    }

    async fn patch_service_selector(
        &self,
        service: &str,
        namespace: &str,
        selector: &Selector,
    ) -> PlatformResult<()> {
        let patch = serde_json::json!({ "spec": { "selector": selector } }).to_string();
        self.run(
            &["patch", "service", service, "-n", namespace, "-p", &patch],
            PlatformError::Patch,
        )
        .await?;
        Ok(())
    }
}

// ── `-o json` parsing ─────────────────────────────────────────────
//
// Partial documents: serde skips everything the workflows do not read.

#[derive(Deserialize)]
struct DeploymentDoc {
    #[serde(default)]
    spec: DeploymentSpecDoc,
    #[serde(default)]
    status: DeploymentStatusDoc,
}

#[derive(Deserialize, Default)]
struct DeploymentSpecDoc {
    #[serde(default)]
    replicas: u32,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DeploymentStatusDoc {
    #[serde(default)]
    ready_replicas: u32,
    #[serde(default)]
    conditions: Vec<ConditionDoc>,
}

#[derive(Deserialize)]
struct ConditionDoc {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

#[derive(Deserialize)]
struct PodListDoc {
    #[serde(default)]
    items: Vec<PodDoc>,
}

#[derive(Deserialize)]
struct PodDoc {
    metadata: MetadataDoc,
}

#[derive(Deserialize)]
struct MetadataDoc {
    name: String,
}

#[derive(Deserialize)]
struct ServiceDoc {
    #[serde(default)]
    spec: ServiceSpecDoc,
}

#[derive(Deserialize, Default)]
struct ServiceSpecDoc {
    #[serde(default)]
    selector: BTreeMap<String, String>,
}

fn parse_deployment_status(json: &str) -> PlatformResult<DeploymentStatus> {
    let doc: DeploymentDoc =
        serde_json::from_str(json).map_err(|e| PlatformError::Parse(e.to_string()))?;
    let available = doc
        .status
        .conditions
        .iter()
        .any(|c| c.kind == "Available" && c.status == "True");
    Ok(DeploymentStatus {
        desired_replicas: doc.spec.replicas,
        ready_replicas: doc.status.ready_replicas,
        available,
    })
}

fn parse_pod_names(json: &str) -> PlatformResult<Vec<String>> {
    let doc: PodListDoc =
        serde_json::from_str(json).map_err(|e| PlatformError::Parse(e.to_string()))?;
    Ok(doc.items.into_iter().map(|p| p.metadata.name).collect())
}

fn parse_service_selector(json: &str) -> PlatformResult<Selector> {
    let doc: ServiceDoc =
        serde_json::from_str(json).map_err(|e| PlatformError::Parse(e.to_string()))?;
    Ok(doc.spec.selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deployment_status() {
        let json = r#"{
            "spec": { "replicas": 3 },
            "status": {
                "readyReplicas": 2,
                "conditions": [
                    { "type": "Progressing", "status": "True" },
                    { "type": "Available", "status": "True" }
                ]
            }
        }"#;
        let status = parse_deployment_status(json).unwrap();
        assert_eq!(status.desired_replicas, 3);
        assert_eq!(status.ready_replicas, 2);
        assert!(status.available);
    }

    #[test]
    fn missing_ready_replicas_defaults_to_zero() {
        // A deployment with no ready pods omits readyReplicas entirely.
        let json = r#"{ "spec": { "replicas": 2 }, "status": {} }"#;
        let status = parse_deployment_status(json).unwrap();
        assert_eq!(status.ready_replicas, 0);
        assert!(!status.available);
    }

    #[test]
    fn available_false_when_condition_is_false() {
        let json = r#"{
            "spec": { "replicas": 1 },
            "status": {
                "readyReplicas": 1,
                "conditions": [ { "type": "Available", "status": "False" } ]
            }
        }"#;
        assert!(!parse_deployment_status(json).unwrap().available);
    }

    #[test]
    fn parses_pod_names_in_order() {
        let json = r#"{
            "items": [
                { "metadata": { "name": "app-7f9-abc" } },
                { "metadata": { "name": "app-7f9-def" } }
            ]
        }"#;
        assert_eq!(
            parse_pod_names(json).unwrap(),
            vec!["app-7f9-abc", "app-7f9-def"]
        );
    }

    #[test]
    fn empty_pod_list_is_ok() {
        assert!(parse_pod_names(r#"{ "items": [] }"#).unwrap().is_empty());
    }

    #[test]
    fn parses_service_selector() {
        let json = r#"{
            "spec": { "selector": { "app": "messaging-app", "version": "blue" } }
        }"#;
        let selector = parse_service_selector(json).unwrap();
        assert_eq!(selector.get("app").unwrap(), "messaging-app");
        assert_eq!(selector.get("version").unwrap(), "blue");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_deployment_status("not json"),
            Err(PlatformError::Parse(_))
        ));
    }
}
