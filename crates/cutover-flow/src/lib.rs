//! cutover-flow — the deployment workflows.
//!
//! Composes the platform primitives (apply, readiness, logs, selector
//! patch) and the health monitor into the two operator-facing workflows:
//!
//! - **Blue/green cutover** — a linear state machine that deploys both
//!   sides, checks the new side's logs, and only then switches traffic.
//! - **Rolling update** — the apply/annotate/rollout/verify sequence
//!   supervised by a concurrent endpoint monitor that must prove baseline
//!   reachability before the apply is issued and is stopped on every exit
//!   path.
//!
//! All abort decisions are made here; the platform and health crates only
//! report typed outcomes.

pub mod bluegreen;
pub mod config;
pub mod error;
pub mod logscan;
pub mod rolling;
pub mod steps;
pub mod switch;

pub use bluegreen::{BlueGreenMachine, Phase, Stage, StageOutcome, run_full_deploy};
pub use config::CutoverConfig;
pub use error::FlowError;
pub use logscan::{LogScanResult, scan_logs};
pub use rolling::{RollingReport, rolling_apply, run_rolling_update};
pub use steps::{ReadinessResult, apply_manifest, verify_replicas, wait_ready};
pub use switch::switch_to;
