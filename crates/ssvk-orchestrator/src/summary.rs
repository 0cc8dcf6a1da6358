// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Sweep Summary and Exit Codes
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

use ssvk_types::{ExperimentResult, SampleStatus};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_INVALID_ARGUMENTS: i32 = 1;
pub const EXIT_ALL_FAILED: i32 = 2;
pub const EXIT_PARTIAL: i32 = 3;

/// Per-status sample counts of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub total: usize,
    pub completed: usize,
    pub inconclusive: usize,
    pub numerical: usize,
    pub timeouts: usize,
    pub cancelled: usize,
}

impl SweepSummary {
    pub fn from_rows(rows: &[ExperimentResult]) -> Self {
        let mut s = Self::default();
        for row in rows {
            s.record(row.status);
        }
        s
    }

    pub fn record(&mut self, status: SampleStatus) {
        self.total += 1;
        match status {
            SampleStatus::Completed => self.completed += 1,
            SampleStatus::Inconclusive => self.inconclusive += 1,
            SampleStatus::NumericalBreakdown => self.numerical += 1,
            SampleStatus::TimedOut => self.timeouts += 1,
            SampleStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.completed + self.inconclusive
    }

    /// Process exit code for the aggregate status.
    ///
    /// Cancellation always reports partial success (3); otherwise 2 when
    /// nothing succeeded, 3 when any sample timed out or broke down, 0
    /// when every sample succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.cancelled > 0 {
            EXIT_PARTIAL
        } else if self.total > 0 && self.succeeded() == 0 {
            EXIT_ALL_FAILED
        } else if self.timeouts + self.numerical > 0 {
            EXIT_PARTIAL
        } else {
            EXIT_SUCCESS
        }
    }
}

impl fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>10} {:>13} {:>10} {:>8} {:>10} {:>6}",
            "completed", "inconclusive", "numerical", "timeout", "cancelled", "total"
        )?;
        write!(
            f,
            "{:>10} {:>13} {:>10} {:>8} {:>10} {:>6}",
            self.completed,
            self.inconclusive,
            self.numerical,
            self.timeouts,
            self.cancelled,
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(statuses: &[SampleStatus]) -> SweepSummary {
        let mut s = SweepSummary::default();
        statuses.iter().for_each(|st| s.record(*st));
        s
    }

    #[test]
    fn test_exit_codes() {
        use SampleStatus::*;
        assert_eq!(summary(&[Completed, Inconclusive]).exit_code(), EXIT_SUCCESS);
        assert_eq!(summary(&[Completed, TimedOut]).exit_code(), EXIT_PARTIAL);
        assert_eq!(summary(&[Completed, NumericalBreakdown]).exit_code(), EXIT_PARTIAL);
        assert_eq!(summary(&[TimedOut, NumericalBreakdown]).exit_code(), EXIT_ALL_FAILED);
        assert_eq!(summary(&[Cancelled, Cancelled]).exit_code(), EXIT_PARTIAL);
        assert_eq!(summary(&[]).exit_code(), EXIT_SUCCESS);
    }

    #[test]
    fn test_display_has_every_column() {
        let text = summary(&[SampleStatus::Completed, SampleStatus::TimedOut]).to_string();
        for col in ["completed", "inconclusive", "numerical", "timeout", "cancelled", "total"] {
            assert!(text.contains(col), "missing {col} in\n{text}");
        }
        assert_eq!(text.lines().count(), 2);
    }
}
