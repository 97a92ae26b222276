//! Probe records and derived summary statistics.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::probe::ProbeOutcome;

/// One entry in a monitor run's append-only ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRecord {
    /// 1-based probe sequence number.
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub outcome: ProbeOutcome,
    pub latency: Duration,
}

/// Statistics derived from a complete ledger. Never stored — recomputed
/// from the records whenever needed.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSummary {
    pub total_probes: u64,
    pub failed_probes: u64,
    pub max_consecutive_failures: u64,
    pub success_rate_pct: f64,
    pub downtime_pct: f64,
    pub duration: Duration,
}

impl std::fmt::Display for MonitorSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "probes:                   {}", self.total_probes)?;
        writeln!(f, "failed:                   {}", self.failed_probes)?;
        writeln!(
            f,
            "max consecutive failures: {}",
            self.max_consecutive_failures
        )?;
        writeln!(f, "success rate:             {:.1}%", self.success_rate_pct)?;
        writeln!(f, "downtime:                 {:.1}%", self.downtime_pct)?;
        write!(f, "duration:                 {:.1}s", self.duration.as_secs_f64())
    }
}

/// Derive summary statistics from a record ledger.
pub fn summarize(records: &[ProbeRecord], duration: Duration) -> MonitorSummary {
    let total = records.len() as u64;
    let failed = records.iter().filter(|r| !r.outcome.is_up()).count() as u64;

    let mut max_streak = 0u64;
    let mut streak = 0u64;
    for record in records {
        if record.outcome.is_up() {
            streak = 0;
        } else {
            streak += 1;
            max_streak = max_streak.max(streak);
        }
    }

    let (success_rate_pct, downtime_pct) = if total == 0 {
        (100.0, 0.0)
    } else {
        let downtime = failed as f64 / total as f64 * 100.0;
        (100.0 - downtime, downtime)
    };

    MonitorSummary {
        total_probes: total,
        failed_probes: failed,
        max_consecutive_failures: max_streak,
        success_rate_pct,
        downtime_pct,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: u64, up: bool) -> ProbeRecord {
        ProbeRecord {
            seq,
            at: Utc::now(),
            outcome: if up {
                ProbeOutcome::Up {
                    status: 200,
                    fell_back: false,
                }
            } else {
                ProbeOutcome::Down {
                    cause: "timeout".to_string(),
                }
            },
            latency: Duration::from_millis(10),
        }
    }

    #[test]
    fn empty_ledger_is_all_clear() {
        let summary = summarize(&[], Duration::ZERO);
        assert_eq!(summary.total_probes, 0);
        assert_eq!(summary.failed_probes, 0);
        assert_eq!(summary.downtime_pct, 0.0);
        assert_eq!(summary.success_rate_pct, 100.0);
    }

    #[test]
    fn five_probes_with_middle_failures() {
        // Probes 2 and 3 fail, the rest succeed.
        let records: Vec<ProbeRecord> = [true, false, false, true, true]
            .iter()
            .enumerate()
            .map(|(i, &up)| record(i as u64 + 1, up))
            .collect();

        let summary = summarize(&records, Duration::from_secs(10));
        assert_eq!(summary.total_probes, 5);
        assert_eq!(summary.failed_probes, 2);
        assert_eq!(summary.max_consecutive_failures, 2);
        assert_eq!(summary.downtime_pct, 40.0);
        assert_eq!(summary.success_rate_pct, 60.0);
    }

    #[test]
    fn separate_streaks_track_the_longest() {
        let pattern = [false, true, false, false, false, true, false];
        let records: Vec<ProbeRecord> = pattern
            .iter()
            .enumerate()
            .map(|(i, &up)| record(i as u64 + 1, up))
            .collect();

        let summary = summarize(&records, Duration::from_secs(14));
        assert_eq!(summary.failed_probes, 5);
        assert_eq!(summary.max_consecutive_failures, 3);
    }

    #[test]
    fn invariants_hold_for_arbitrary_ledgers() {
        // downtimePct == failed/total*100, failed <= total,
        // maxConsecutive <= total.
        for pattern in [
            vec![],
            vec![true],
            vec![false],
            vec![true, false, true, false],
            vec![false; 7],
            vec![true; 7],
        ] {
            let records: Vec<ProbeRecord> = pattern
                .iter()
                .enumerate()
                .map(|(i, &up)| record(i as u64 + 1, up))
                .collect();
            let s = summarize(&records, Duration::from_secs(1));
            assert!(s.failed_probes <= s.total_probes);
            assert!(s.max_consecutive_failures <= s.total_probes);
            if s.total_probes > 0 {
                let expected = s.failed_probes as f64 / s.total_probes as f64 * 100.0;
                assert_eq!(s.downtime_pct, expected);
            }
        }
    }

    #[test]
    fn display_includes_downtime() {
        let summary = summarize(&[record(1, false)], Duration::from_secs(2));
        let text = summary.to_string();
        assert!(text.contains("downtime"));
        assert!(text.contains("100.0%"));
    }
}
