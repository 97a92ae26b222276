//! Blue/green cutover — linear state machine plus the async driver.
//!
//! The machine itself is pure: it names the stage to execute next and
//! transitions on the recorded outcome. All platform IO lives in the
//! driver, so the abort rules are unit-testable without a cluster.
//!
//! Stage order:
//! `DeployBlue → ApplyServices → CheckBlueLogs → DeployGreen →
//!  CheckGreenLogs → SwitchToGreen`
//!
//! Log errors on blue are advisory (blue is presumed already serving);
//! log errors on green abort *before* any selector patch, so green is
//! never exposed while its own logs show error signatures.

use std::fmt;

use cutover_platform::{Color, PlatformClient};
use tracing::{info, warn};

use crate::config::CutoverConfig;
use crate::error::FlowError;
use crate::logscan::scan_logs;
use crate::steps::{apply_manifest, wait_ready};
use crate::switch::switch_to;

/// One stage of the cutover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DeployBlue,
    ApplyServices,
    CheckBlueLogs,
    DeployGreen,
    CheckGreenLogs,
    SwitchToGreen,
}

impl Stage {
    fn next(self) -> Option<Stage> {
        match self {
            Stage::DeployBlue => Some(Stage::ApplyServices),
            Stage::ApplyServices => Some(Stage::CheckBlueLogs),
            Stage::CheckBlueLogs => Some(Stage::DeployGreen),
            Stage::DeployGreen => Some(Stage::CheckGreenLogs),
            Stage::CheckGreenLogs => Some(Stage::SwitchToGreen),
            Stage::SwitchToGreen => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::DeployBlue => "deploy-blue",
            Stage::ApplyServices => "apply-services",
            Stage::CheckBlueLogs => "check-blue-logs",
            Stage::DeployGreen => "deploy-green",
            Stage::CheckGreenLogs => "check-green-logs",
            Stage::SwitchToGreen => "switch-to-green",
        };
        f.write_str(name)
    }
}

/// Where the workflow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Init,
    Running(Stage),
    Done,
    Aborted { stage: Stage, reason: String },
}

/// What executing a stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Ok,
    /// Error signatures found in the scanned deployment's logs.
    LogErrors { pods: Vec<String> },
    Failed(String),
}

/// The pure cutover state machine.
#[derive(Debug)]
pub struct BlueGreenMachine {
    phase: Phase,
}

impl BlueGreenMachine {
    pub fn new() -> Self {
        Self { phase: Phase::Init }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The stage to execute next; `None` once terminal.
    pub fn current(&self) -> Option<Stage> {
        match &self.phase {
            Phase::Init => Some(Stage::DeployBlue),
            Phase::Running(stage) => Some(*stage),
            Phase::Done | Phase::Aborted { .. } => None,
        }
    }

    /// Record the outcome of the current stage and transition.
    pub fn record(&mut self, outcome: StageOutcome) {
        let Some(stage) = self.current() else {
            return;
        };

        match outcome {
            StageOutcome::Ok => self.advance(stage),
            StageOutcome::LogErrors { pods } => match stage {
                // Blue is presumed live; aborting here would disrupt it.
                Stage::CheckBlueLogs => {
                    warn!(pods = ?pods, "blue logs show error signatures; continuing");
                    self.advance(stage);
                }
                _ => {
                    self.phase = Phase::Aborted {
                        stage,
                        reason: format!("error signatures in pods: {}", pods.join(", ")),
                    };
                }
            },
            StageOutcome::Failed(reason) => {
                self.phase = Phase::Aborted { stage, reason };
            }
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.phase = match stage.next() {
            Some(next) => Phase::Running(next),
            None => Phase::Done,
        };
    }
}

impl Default for BlueGreenMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full blue/green cutover.
///
/// On abort, current traffic state is unchanged: either nothing was
/// switched yet, or the switch itself was rejected atomically.
pub async fn run_full_deploy<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
) -> Result<(), FlowError> {
    let mut machine = BlueGreenMachine::new();
    let mut abort: Option<FlowError> = None;

    while let Some(stage) = machine.current() {
        info!(%stage, "cutover stage");
        let outcome = match execute_stage(platform, cfg, stage).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let outcome = StageOutcome::Failed(e.to_string());
                abort = Some(e);
                outcome
            }
        };
        // The machine owns the fatality rule; mirror the typed error so
        // the caller gets the pod list, not a flattened string.
        if stage == Stage::CheckGreenLogs {
            if let StageOutcome::LogErrors { pods } = &outcome {
                abort = Some(FlowError::LogSignatures {
                    deployment: cfg.target(Color::Green).name,
                    pods: pods.clone(),
                });
            }
        }
        machine.record(outcome);
    }

    match machine.phase() {
        Phase::Done => {
            info!("blue/green cutover complete, green is live");
            Ok(())
        }
        Phase::Aborted { stage, reason } => {
            warn!(%stage, %reason, "cutover aborted");
            Err(abort.unwrap_or_else(|| FlowError::LogSignatures {
                deployment: cfg.target(Color::Green).name,
                pods: Vec::new(),
            }))
        }
        // `current()` returned None, so the machine is terminal.
        Phase::Init | Phase::Running(_) => unreachable!("machine left non-terminal"),
    }
}

async fn execute_stage<P: PlatformClient>(
    platform: &P,
    cfg: &CutoverConfig,
    stage: Stage,
) -> Result<StageOutcome, FlowError> {
    match stage {
        Stage::DeployBlue => {
            let blue = cfg.target(Color::Blue);
            apply_manifest(platform, &blue.manifest).await?;
            wait_ready(platform, &blue, cfg.readiness_timeout, cfg.poll_interval).await?;
            Ok(StageOutcome::Ok)
        }
        Stage::ApplyServices => {
            apply_manifest(platform, &cfg.service_manifest).await?;
            Ok(StageOutcome::Ok)
        }
        Stage::CheckBlueLogs => {
            let blue = cfg.target(Color::Blue);
            // A failed scan here is an observability gap, not an abort.
            match scan_logs(platform, &blue, cfg.log_tail_lines).await {
                Ok(scan) if scan.has_errors() => Ok(StageOutcome::LogErrors {
                    pods: scan.dirty_pods(),
                }),
                Ok(_) => Ok(StageOutcome::Ok),
                Err(e) => {
                    warn!(error = %e, "blue log scan failed; continuing");
                    Ok(StageOutcome::Ok)
                }
            }
        }
        Stage::DeployGreen => {
            let green = cfg.target(Color::Green);
            apply_manifest(platform, &green.manifest).await?;
            wait_ready(platform, &green, cfg.readiness_timeout, cfg.poll_interval).await?;
            Ok(StageOutcome::Ok)
        }
        Stage::CheckGreenLogs => {
            let green = cfg.target(Color::Green);
            let scan = scan_logs(platform, &green, cfg.log_tail_lines).await?;
            if scan.has_errors() {
                return Ok(StageOutcome::LogErrors {
                    pods: scan.dirty_pods(),
                });
            }
            Ok(StageOutcome::Ok)
        }
        Stage::SwitchToGreen => {
            let green = cfg.target(Color::Green);
            switch_to(platform, &cfg.service, &green).await?;
            Ok(StageOutcome::Ok)
        }
    }
}
