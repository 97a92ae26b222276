//! Domain types shared by the deployment workflows.
//!
//! These mirror the small slice of platform state the orchestrator cares
//! about: which deployment a workflow is driving, how many of its replicas
//! are ready, and which pod labels a service selector resolves to. All
//! types are JSON-serializable for status output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Label selector: label key → required value.
///
/// Ordered so selectors compare and render deterministically.
pub type Selector = BTreeMap<String, String>;

// ── Deployment target ─────────────────────────────────────────────

/// Which side of a blue/green pair a deployment is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Green,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Green => "green",
        }
    }

    /// The opposite side of the pair.
    pub fn other(&self) -> Color {
        match self {
            Color::Blue => Color::Green,
            Color::Green => Color::Blue,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One deployment a workflow drives: identity, manifest, desired scale,
/// and the pod labels its service selector would match.
///
/// Immutable for the duration of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub name: String,
    pub namespace: String,
    /// Path to the declarative manifest that creates/updates this deployment.
    pub manifest: PathBuf,
    pub desired_replicas: u32,
    /// `None` for a single-deployment rolling update.
    pub color: Option<Color>,
    /// Pod labels, used both for log-scan pod enumeration and as the
    /// selector a service is patched to when traffic switches here.
    pub labels: Selector,
}

impl DeploymentTarget {
    /// Build a target with the conventional `app` (+ optional `version`)
    /// label pair.
    pub fn new(
        name: &str,
        namespace: &str,
        manifest: PathBuf,
        desired_replicas: u32,
        app_label: &str,
        color: Option<Color>,
    ) -> Self {
        let mut labels = Selector::new();
        labels.insert("app".to_string(), app_label.to_string());
        if let Some(color) = color {
            labels.insert("version".to_string(), color.as_str().to_string());
        }
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            manifest,
            desired_replicas,
            color,
            labels,
        }
    }
}

// ── Deployment status ─────────────────────────────────────────────

/// Platform-reported state of a deployment, as read at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub desired_replicas: u32,
    pub ready_replicas: u32,
    /// The platform's "Available" condition.
    pub available: bool,
}

impl DeploymentStatus {
    /// Replica parity: every desired replica is ready, and there is at
    /// least one. A deployment scaled to zero is never "ready".
    pub fn at_parity(&self) -> bool {
        self.desired_replicas > 0 && self.ready_replicas == self.desired_replicas
    }
}

/// Render a selector as `k=v,k=v` (the platform CLI's `-l` syntax).
pub fn selector_string(selector: &Selector) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
