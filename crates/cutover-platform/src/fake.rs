//! In-memory platform for tests.
//!
//! `FakePlatform` holds a scriptable cluster: registered manifests with
//! the deployment state they produce when applied, services with
//! selectors, and pods with canned log output. Workflow crates drive it
//! through the same [`PlatformClient`] trait as the real client.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::client::PlatformClient;
use crate::error::{PlatformError, PlatformResult};
use crate::types::{DeploymentStatus, Selector};

/// What applying a registered manifest does to the fake cluster.
#[derive(Debug, Clone)]
struct ManifestEffect {
    deployment: String,
    namespace: String,
    status: DeploymentStatus,
    /// Status queries to answer "not ready yet" before `status` is
    /// reported (simulates a deployment still rolling out).
    ready_after_polls: u32,
}

#[derive(Debug, Clone)]
struct FakePod {
    name: String,
    namespace: String,
    labels: Selector,
    /// `Err` simulates an unreachable pod (log retrieval fails).
    logs: Result<String, String>,
}

#[derive(Debug, Default)]
struct FakeState {
    manifests: BTreeMap<PathBuf, ManifestEffect>,
    rejected_manifests: BTreeMap<PathBuf, String>,
    /// `{namespace}/{name}` → (status, polls remaining until ready).
    deployments: BTreeMap<String, (DeploymentStatus, u32)>,
    services: BTreeMap<String, Selector>,
    pods: Vec<FakePod>,
    annotations: BTreeMap<String, BTreeMap<String, String>>,
    applied: Vec<PathBuf>,
    patch_attempts: u32,
}

fn key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

/// Scriptable in-memory platform.
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manifest: applying `path` installs `status` for the
    /// deployment after `ready_after_polls` status queries.
    pub fn register_manifest(
        &self,
        path: impl Into<PathBuf>,
        deployment: &str,
        namespace: &str,
        status: DeploymentStatus,
        ready_after_polls: u32,
    ) {
        let mut state = self.state.lock().unwrap();
        state.manifests.insert(
            path.into(),
            ManifestEffect {
                deployment: deployment.to_string(),
                namespace: namespace.to_string(),
                status,
                ready_after_polls,
            },
        );
    }

    /// Register a manifest the platform will reject.
    pub fn reject_manifest(&self, path: impl Into<PathBuf>, reason: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .rejected_manifests
            .insert(path.into(), reason.to_string());
    }

    /// Register a manifest that only needs to be accepted (e.g. a
    /// service definition with no deployment behind it).
    pub fn register_inert_manifest(&self, path: impl Into<PathBuf>) {
        self.register_manifest(path, "", "", DeploymentStatus::default(), 0);
    }

    pub fn insert_service(&self, service: &str, namespace: &str, selector: Selector) {
        let mut state = self.state.lock().unwrap();
        state.services.insert(key(namespace, service), selector);
    }

    pub fn insert_pod(&self, name: &str, namespace: &str, labels: Selector, logs: &str) {
        let mut state = self.state.lock().unwrap();
        state.pods.push(FakePod {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels,
            logs: Ok(logs.to_string()),
        });
    }

    /// A pod whose logs cannot be retrieved.
    pub fn insert_unreachable_pod(&self, name: &str, namespace: &str, labels: Selector) {
        let mut state = self.state.lock().unwrap();
        state.pods.push(FakePod {
            name: name.to_string(),
            namespace: namespace.to_string(),
            labels,
            logs: Err("connection refused".to_string()),
        });
    }

    // ── Assertions ────────────────────────────────────────────────

    /// How many times any manifest has been applied.
    pub fn applied(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().applied.clone()
    }

    /// Current deployment state, as a test would snapshot it.
    pub fn deployment(&self, name: &str, namespace: &str) -> Option<DeploymentStatus> {
        let state = self.state.lock().unwrap();
        state
            .deployments
            .get(&key(namespace, name))
            .map(|(status, _)| *status)
    }

    /// How many selector patches have been attempted (accepted or not).
    pub fn patch_attempts(&self) -> u32 {
        self.state.lock().unwrap().patch_attempts
    }

    /// Annotation value recorded on a deployment, if any.
    pub fn annotation(&self, name: &str, namespace: &str, annotation_key: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .annotations
            .get(&key(namespace, name))
            .and_then(|m| m.get(annotation_key))
            .cloned()
    }
}

impl PlatformClient for FakePlatform {
    async fn apply_manifest(&self, manifest: &Path) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.rejected_manifests.get(manifest) {
            return Err(PlatformError::Rejected(reason.clone()));
        }
        let Some(effect) = state.manifests.get(manifest).cloned() else {
            return Err(PlatformError::Rejected(format!(
                "unknown manifest {}",
                manifest.display()
            )));
        };
        state.applied.push(manifest.to_path_buf());
        if !effect.deployment.is_empty() {
            state.deployments.insert(
                key(&effect.namespace, &effect.deployment),
                (effect.status, effect.ready_after_polls),
            );
        }
        Ok(())
    }

    async fn deployment_status(
        &self,
        name: &str,
        namespace: &str,
    ) -> PlatformResult<DeploymentStatus> {
        let mut state = self.state.lock().unwrap();
        let Some((status, polls_left)) = state.deployments.get_mut(&key(namespace, name)) else {
            return Err(PlatformError::NotFound(format!(
                "deployment {namespace}/{name}"
            )));
        };
        if *polls_left > 0 {
            *polls_left -= 1;
            return Ok(DeploymentStatus {
                desired_replicas: status.desired_replicas,
                ready_replicas: 0,
                available: false,
            });
        }
        Ok(*status)
    }

    async fn annotate_deployment(
        &self,
        name: &str,
        namespace: &str,
        annotation_key: &str,
        value: &str,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        let k = key(namespace, name);
        if !state.deployments.contains_key(&k) {
            return Err(PlatformError::NotFound(format!(
                "deployment {namespace}/{name}"
            )));
        }
        state
            .annotations
            .entry(k)
            .or_default()
            .insert(annotation_key.to_string(), value.to_string());
        Ok(())
    }

    async fn pods_matching(
        &self,
        selector: &Selector,
        namespace: &str,
    ) -> PlatformResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .pods
            .iter()
            .filter(|p| {
                p.namespace == namespace
                    && selector
                        .iter()
                        .all(|(k, v)| p.labels.get(k).is_some_and(|pv| pv == v))
            })
            .map(|p| p.name.clone())
            .collect())
    }

    async fn pod_logs(&self, pod: &str, namespace: &str, tail_lines: u32) -> PlatformResult<String> {
        let state = self.state.lock().unwrap();
        let found = state
            .pods
            .iter()
            .find(|p| p.name == pod && p.namespace == namespace)
            .ok_or_else(|| PlatformError::NotFound(format!("pod {namespace}/{pod}")))?;
        match &found.logs {
            Ok(text) => {
                let lines: Vec<&str> = text.lines().collect();
                let start = lines.len().saturating_sub(tail_lines as usize);
                Ok(lines[start..].join("\n"))
            }
            Err(reason) => Err(PlatformError::Logs {
                pod: pod.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    async fn service_selector(&self, service: &str, namespace: &str) -> PlatformResult<Selector> {
        let state = self.state.lock().unwrap();
        state
            .services
            .get(&key(namespace, service))
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("service {namespace}/{service}")))
    }

    async fn patch_service_selector(
        &self,
        service: &str,
        namespace: &str,
        selector: &Selector,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.patch_attempts += 1;
        let Some(current) = state.services.get_mut(&key(namespace, service)) else {
            return Err(PlatformError::Patch(format!(
                "service {namespace}/{service} not found"
            )));
        };
        // Strategic-merge semantics: supplied keys overwrite, others stay.
        for (k, v) in selector {
            current.insert(k.clone(), v.clone());
        }
        Ok(())
    }
}
