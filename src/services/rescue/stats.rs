// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug)]
pub struct SubmissionStats {
    pub attempted: AtomicU64,
    pub accepted: AtomicU64,
    pub failed: AtomicU64,
    pub timeouts: AtomicU64,
    pub rejected_in_flight: AtomicU64,
    pub simulation_warnings: AtomicU64,
    pub receipts: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub attempted: u64,
    pub accepted: u64,
    pub failed: u64,
    pub timeouts: u64,
    pub rejected_in_flight: u64,
    pub simulation_warnings: u64,
    pub receipts: u64,
}

impl SubmissionStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempted: self.attempted.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            rejected_in_flight: self.rejected_in_flight.load(Ordering::Relaxed),
            simulation_warnings: self.simulation_warnings.load(Ordering::Relaxed),
            receipts: self.receipts.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        tracing::info!(
            target: "rescue",
            attempted = s.attempted,
            accepted = s.accepted,
            failed = s.failed,
            timeouts = s.timeouts,
            rejected_in_flight = s.rejected_in_flight,
            simulation_warnings = s.simulation_warnings,
            receipts = s.receipts,
            "Submission stats"
        );
    }
}
