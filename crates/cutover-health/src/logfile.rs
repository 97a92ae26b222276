//! Durable probe log.
//!
//! A monitor run writes one timestamped file recording every probe
//! outcome and the final statistics — the only durable state this
//! subsystem produces.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::stats::{MonitorSummary, ProbeRecord};
use crate::probe::ProbeOutcome;

/// Line-oriented probe log file, named `cutover-monitor-<timestamp>.log`.
#[derive(Debug)]
pub struct ProbeLog {
    file: File,
    path: PathBuf,
}

impl ProbeLog {
    /// Create a new log file in `dir` named after the current local time.
    pub fn create(dir: &Path) -> io::Result<Self> {
        let name = format!(
            "cutover-monitor-{}.log",
            Local::now().format("%Y%m%d-%H%M%S")
        );
        let path = dir.join(name);
        let file = File::create(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one probe outcome line.
    pub fn record(&mut self, record: &ProbeRecord) -> io::Result<()> {
        let line = match &record.outcome {
            ProbeOutcome::Up { status, fell_back } => format!(
                "{} #{} UP status={} latency={}ms{}",
                record.at.to_rfc3339(),
                record.seq,
                status,
                record.latency.as_millis(),
                if *fell_back { " (fallback path)" } else { "" },
            ),
            ProbeOutcome::Down { cause } => format!(
                "{} #{} DOWN {}",
                record.at.to_rfc3339(),
                record.seq,
                cause
            ),
        };
        writeln!(self.file, "{line}")
    }

    /// Append a free-form note (e.g. a recovery event).
    pub fn note(&mut self, note: &str) -> io::Result<()> {
        writeln!(self.file, "{} -- {note}", chrono::Utc::now().to_rfc3339())
    }

    /// Append the final statistics block and flush.
    pub fn finish(&mut self, summary: &MonitorSummary) -> io::Result<()> {
        writeln!(self.file, "---")?;
        writeln!(self.file, "{summary}")?;
        self.file.flush()
    }
}
