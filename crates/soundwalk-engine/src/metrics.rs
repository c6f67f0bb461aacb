//! Cumulative session metrics.
//!
//! [`SessionMetrics`] counts what happened over the lifetime of a
//! session, enabling telemetry and debugging of field walks.

use crate::reconcile::ReconcileOutcome;

/// Counters collected across reconciliation cycles.
///
/// All counters are cumulative since session start except
/// `last_cycle_us`, which reflects the most recent completed cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionMetrics {
    /// Completed reconciliation cycles.
    pub cycles: u64,
    /// Surroundings fetches that failed.
    pub fetch_failures: u64,
    /// Samples dropped before fetching (repeated, inaccurate, or invalid).
    pub skipped_samples: u64,
    /// Realtime samples replaced by a fresher one before processing.
    pub superseded_samples: u64,
    /// Spots entered.
    pub entered_total: u64,
    /// Spots left.
    pub left_total: u64,
    /// Cycles that entered at least one global-stop zone.
    pub global_stops: u64,
    /// Per-spot sink operations that failed.
    pub playback_failures: u64,
    /// Snapshot ids not present in the catalog.
    pub ignored_ids: u64,
    /// Runs that ended on their own.
    pub completed_runs: u64,
    /// Wall-clock time of the last cycle (fetch and reconcile), in microseconds.
    pub last_cycle_us: u64,
}

impl SessionMetrics {
    /// Fold one cycle's outcome into the counters.
    pub(crate) fn record_cycle(&mut self, outcome: &ReconcileOutcome, elapsed_us: u64) {
        self.cycles += 1;
        self.entered_total += outcome.entered.len() as u64;
        self.left_total += outcome.left.len() as u64;
        self.ignored_ids += outcome.ignored.len() as u64;
        self.playback_failures += outcome.failures.len() as u64;
        if outcome.global_stop() {
            self.global_stops += 1;
        }
        self.last_cycle_us = elapsed_us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundwalk_core::{PlaybackError, PlaybackOp, SpotId};

    use crate::playback::SpotFailure;

    #[test]
    fn default_metrics_are_zero() {
        let m = SessionMetrics::default();
        assert_eq!(m.cycles, 0);
        assert_eq!(m.fetch_failures, 0);
        assert_eq!(m.skipped_samples, 0);
        assert_eq!(m.superseded_samples, 0);
        assert_eq!(m.completed_runs, 0);
        assert_eq!(m.last_cycle_us, 0);
    }

    #[test]
    fn record_cycle_accumulates() {
        let mut m = SessionMetrics::default();
        let outcome = ReconcileOutcome {
            entered: vec![SpotId(1), SpotId(2)],
            left: vec![SpotId(3)],
            stop_zone_entered: true,
            silenced: vec![SpotId(4)],
            ignored: vec![SpotId(99)],
            failures: vec![SpotFailure {
                spot: SpotId(2),
                op: PlaybackOp::Play,
                error: PlaybackError::NotReady {
                    handle: soundwalk_core::AudioHandle(7),
                },
            }],
        };
        m.record_cycle(&outcome, 120);
        m.record_cycle(&ReconcileOutcome::default(), 40);
        assert_eq!(m.cycles, 2);
        assert_eq!(m.entered_total, 2);
        assert_eq!(m.left_total, 1);
        assert_eq!(m.global_stops, 1);
        assert_eq!(m.ignored_ids, 1);
        assert_eq!(m.playback_failures, 1);
        assert_eq!(m.last_cycle_us, 40);
    }

    #[test]
    fn silent_stop_zone_entry_is_counted() {
        let mut m = SessionMetrics::default();
        let outcome = ReconcileOutcome {
            entered: vec![SpotId(9)],
            stop_zone_entered: true,
            ..ReconcileOutcome::default()
        };
        m.record_cycle(&outcome, 10);
        assert_eq!(m.global_stops, 1);
    }
}
