//! Per-session scan counters.

use crate::verify::CheckOutcome;
use parking_lot::Mutex;
use std::sync::Arc;

/// Counters for one scanning session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    /// Scans that passed the debounce.
    pub accepted: u64,
    /// Repeat reads dropped by the debounce.
    pub debounced: u64,
    /// Entries granted.
    pub granted: u64,
    /// Tickets presented a second time.
    pub already_used: u64,
    /// Tickets the server rejected.
    pub rejected: u64,
    /// Other refusals.
    pub failed: u64,
    /// Verifications with no usable reply.
    pub unreachable: u64,
    /// Outcomes dropped because a newer scan was already accepted.
    pub superseded: u64,
}

impl ScanStats {
    /// Number of verifications that produced an outcome.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.granted + self.already_used + self.rejected + self.failed + self.unreachable
    }

    fn record(&mut self, outcome: &CheckOutcome) {
        match outcome {
            CheckOutcome::Granted { .. } => self.granted += 1,
            CheckOutcome::AlreadyUsed { .. } => self.already_used += 1,
            CheckOutcome::Rejected { .. } => self.rejected += 1,
            CheckOutcome::Failed { .. } => self.failed += 1,
            CheckOutcome::Unreachable => self.unreachable += 1,
        }
    }
}

/// Shared handle to session counters.
#[derive(Debug, Clone, Default)]
pub struct StatsTracker {
    inner: Arc<Mutex<ScanStats>>,
}

impl StatsTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn accepted(&self) {
        self.inner.lock().accepted += 1;
    }

    pub(crate) fn debounced(&self) {
        self.inner.lock().debounced += 1;
    }

    pub(crate) fn superseded(&self) {
        self.inner.lock().superseded += 1;
    }

    pub(crate) fn outcome(&self, outcome: &CheckOutcome) {
        self.inner.lock().record(outcome);
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> ScanStats {
        self.inner.lock().clone()
    }
}
