// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all kernel failures.
#[derive(Error, Debug)]
pub enum SsvkError {
    /// Nonsensical sizes, empty graphs, non-finite weights, bad signs,
    /// degree mismatches. Aborts the whole run.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Eigensolver failed to converge or its residual exceeded tolerance.
    #[error("numerical breakdown: {0}")]
    NumericalBreakdown(String),

    /// Post-fit mean spacing fell outside tolerance, or the spectrum was
    /// too degenerate to fit a monotone staircase.
    #[error("unfolding failure: {0}")]
    UnfoldingFailure(String),

    /// Cooperative per-sample timeout tripped.
    #[error("timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    TimedOut { elapsed_ms: u64, budget_ms: u64 },

    /// The orchestrator received a cancellation signal.
    #[error("cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Result table or figure could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plotting backend failed.
    #[error("plot error: {0}")]
    Plot(String),
}

impl SsvkError {
    /// Whether the failure is contained at the sweep-sample boundary.
    ///
    /// Numerical, unfolding and timeout failures mark a single sample;
    /// everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SsvkError::NumericalBreakdown(_)
                | SsvkError::UnfoldingFailure(_)
                | SsvkError::TimedOut { .. }
        )
    }
}

pub type SsvkResult<T> = Result<T, SsvkError>;
