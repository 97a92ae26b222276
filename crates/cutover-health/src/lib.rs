//! cutover-health — endpoint reachability monitoring during deployments.
//!
//! Runs a strictly serial probe loop against the service endpoint real
//! users hit, classifying each probe as up or down and deriving downtime
//! statistics from the resulting append-only record ledger.
//!
//! # Architecture
//!
//! ```text
//! monitor::start(prober, config, log)
//!   ├── background task: probe → record → tick (one probe in flight)
//!   ├── watch shutdown signal, baseline signal on first success
//!   ├── ProbeLog — one line per probe, final stats block
//!   └── MonitorHandle::stop()/join() → MonitorRun → MonitorSummary
//! ```
//!
//! A probe counts as *down* only on transport-level failure or timeout.
//! Any HTTP response, 2xx or not, counts as reachable — the monitor
//! measures unreachability, not correctness.

pub mod logfile;
pub mod monitor;
pub mod probe;
pub mod stats;

pub use logfile::ProbeLog;
pub use monitor::{MonitorConfig, MonitorHandle, MonitorRun, start};
pub use probe::{HttpProber, ProbeOutcome, Prober};
pub use stats::{MonitorSummary, ProbeRecord, summarize};
