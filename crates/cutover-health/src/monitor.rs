//! The monitor task.
//!
//! One background task probes the endpoint serially — one probe in
//! flight, a fixed interval between ticks. The foreground workflow and
//! the monitor share nothing but the stop signal and the final run,
//! read once after join. Stopping is race-free: an in-flight probe
//! always completes and is recorded before the task observes the stop
//! signal, so the final summary neither loses nor duplicates records.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::logfile::ProbeLog;
use crate::probe::Prober;
use crate::stats::{MonitorSummary, ProbeRecord, summarize};

/// Monitor loop parameters.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between the end of one probe and the start of the next.
    pub interval: Duration,
    /// Stop after this many probes; `None` runs until stopped.
    pub max_probes: Option<u64>,
}

/// The completed ledger of one monitor run.
#[derive(Debug)]
pub struct MonitorRun {
    pub records: Vec<ProbeRecord>,
    pub duration: Duration,
    /// Where the probe log was written, if one was attached.
    pub log_path: Option<PathBuf>,
}

impl MonitorRun {
    pub fn summary(&self) -> MonitorSummary {
        summarize(&self.records, self.duration)
    }
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    baseline_rx: watch::Receiver<bool>,
    handle: JoinHandle<MonitorRun>,
}

impl MonitorHandle {
    /// Wait until the first successful probe, or until `timeout`.
    ///
    /// Returns whether the endpoint proved reachable. Workflows use this
    /// to establish a baseline before touching the deployment.
    pub async fn wait_baseline(&mut self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.baseline_rx.wait_for(|ok| *ok))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false)
    }

    /// Signal stop and join. Any in-flight probe finishes and is
    /// included in the returned run exactly once.
    pub async fn stop(self) -> MonitorRun {
        let _ = self.shutdown_tx.send(true);
        self.join_inner().await
    }

    /// Wait for the task to finish on its own (requires `max_probes`).
    pub async fn join(self) -> MonitorRun {
        self.join_inner().await
    }

    async fn join_inner(self) -> MonitorRun {
        match self.handle.await {
            Ok(run) => run,
            Err(e) => {
                error!(error = %e, "monitor task failed");
                MonitorRun {
                    records: Vec::new(),
                    duration: Duration::ZERO,
                    log_path: None,
                }
            }
        }
    }
}

/// Spawn the monitor task.
pub fn start<P>(prober: P, config: MonitorConfig, log: Option<ProbeLog>) -> MonitorHandle
where
    P: Prober + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (baseline_tx, baseline_rx) = watch::channel(false);

    let handle = tokio::spawn(run_loop(prober, config, log, shutdown_rx, baseline_tx));

    MonitorHandle {
        shutdown_tx,
        baseline_rx,
        handle,
    }
}

async fn run_loop<P: Prober>(
    prober: P,
    config: MonitorConfig,
    mut log: Option<ProbeLog>,
    mut shutdown: watch::Receiver<bool>,
    baseline_tx: watch::Sender<bool>,
) -> MonitorRun {
    let started = Instant::now();
    let mut records: Vec<ProbeRecord> = Vec::new();
    let mut consecutive_failures: u64 = 0;

    debug!(interval = ?config.interval, max_probes = ?config.max_probes, "monitor starting");

    loop {
        // The probe itself is never interrupted by the stop signal; the
        // signal is only observed between ticks.
        let t0 = Instant::now();
        let outcome = prober.probe().await;
        let latency = t0.elapsed();

        let seq = records.len() as u64 + 1;
        if outcome.is_up() {
            if consecutive_failures > 0 {
                info!(failures = consecutive_failures, probe = seq, "endpoint recovered");
                if let Some(log) = log.as_mut() {
                    let _ = log.note(&format!(
                        "endpoint recovered after {consecutive_failures} failed probes"
                    ));
                }
            }
            consecutive_failures = 0;
            let _ = baseline_tx.send(true);
        } else {
            consecutive_failures += 1;
            warn!(probe = seq, streak = consecutive_failures, "probe failed");
        }

        let record = ProbeRecord {
            seq,
            at: Utc::now(),
            outcome,
            latency,
        };
        if let Some(log) = log.as_mut() {
            if let Err(e) = log.record(&record) {
                warn!(error = %e, "failed to write probe log line");
            }
        }
        records.push(record);

        if let Some(max) = config.max_probes {
            if records.len() as u64 >= max {
                debug!(probes = records.len(), "monitor reached probe budget");
                break;
            }
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(config.interval) => {}
        }
        if *shutdown.borrow() {
            break;
        }
    }

    let duration = started.elapsed();
    let summary = summarize(&records, duration);
    let log_path = log.as_ref().map(|l| l.path().to_path_buf());
    if let Some(log) = log.as_mut() {
        if let Err(e) = log.finish(&summary) {
            warn!(error = %e, "failed to write probe log summary");
        }
    }
    info!(
        probes = summary.total_probes,
        failed = summary.failed_probes,
        downtime_pct = summary.downtime_pct,
        "monitor stopped"
    );

    MonitorRun {
        records,
        duration,
        log_path,
    }
}
