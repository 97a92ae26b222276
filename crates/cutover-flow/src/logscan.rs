//! Log inspection.
//!
//! Fetches recent log output for every pod behind a deployment and scans
//! each line for the fixed error-signature set. A pod whose logs cannot
//! be retrieved is a warning, not evidence of a broken deployment.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use cutover_platform::{DeploymentTarget, PlatformClient};
use regex::Regex;
use tracing::{info, warn};

use crate::error::FlowError;

/// Case-insensitive signature set. Substring semantics: any occurrence
/// anywhere in a line counts.
static ERROR_SIGNATURES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error|exception|failed|traceback").unwrap());

/// Result of one scan. Built fresh each invocation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogScanResult {
    pub deployment: String,
    /// All matched pods, in platform order, including clean ones.
    pub pods: Vec<String>,
    /// Pod → matched lines, in log order. Clean pods are absent.
    pub matches: BTreeMap<String, Vec<String>>,
    /// Pods whose logs could not be retrieved.
    pub warnings: Vec<String>,
}

impl LogScanResult {
    /// True iff any pod has at least one matching line.
    pub fn has_errors(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Pods with at least one match, in order.
    pub fn dirty_pods(&self) -> Vec<String> {
        self.matches.keys().cloned().collect()
    }
}

/// Scan the last `tail_lines` of every pod matching the target's labels.
pub async fn scan_logs<P: PlatformClient>(
    platform: &P,
    target: &DeploymentTarget,
    tail_lines: u32,
) -> Result<LogScanResult, FlowError> {
    let pods = platform
        .pods_matching(&target.labels, &target.namespace)
        .await?;

    let mut matches: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut warnings = Vec::new();

    for pod in &pods {
        match platform.pod_logs(pod, &target.namespace, tail_lines).await {
            Ok(text) => {
                let hits: Vec<String> = text
                    .lines()
                    .filter(|line| ERROR_SIGNATURES.is_match(line))
                    .map(str::to_string)
                    .collect();
                if !hits.is_empty() {
                    matches.insert(pod.clone(), hits);
                }
            }
            Err(e) => {
                // Observability gap, not deployment failure.
                warn!(%pod, error = %e, "could not retrieve pod logs");
                warnings.push(pod.clone());
            }
        }
    }

    info!(
        deployment = %target.name,
        pods = pods.len(),
        dirty = matches.len(),
        unreachable = warnings.len(),
        "log scan complete"
    );

    Ok(LogScanResult {
        deployment: target.name.clone(),
        pods,
        matches,
        warnings,
    })
}
