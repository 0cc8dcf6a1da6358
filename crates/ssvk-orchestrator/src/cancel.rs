// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Cancellation and Per-Sample Deadlines
// ─────────────────────────────────────────────────────────────────────

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ssvk_types::{Checkpoint, SsvkError, SsvkResult};

/// Shared cooperative cancellation flag.
///
/// Clones observe the same flag; `cancel()` from any clone (or another
/// thread) is seen by every sample at its next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            log::warn!("sweep cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Checkpoint for CancellationToken {
    fn check(&self) -> SsvkResult<()> {
        if self.is_cancelled() {
            Err(SsvkError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Deadline of a single sweep sample, combined with the sweep's
/// cancellation token. A zero budget trips at the first check.
#[derive(Debug, Clone)]
pub struct SampleBudget {
    started: Instant,
    budget: Duration,
    token: CancellationToken,
}

impl SampleBudget {
    pub fn start(budget: Duration, token: CancellationToken) -> Self {
        Self {
            started: Instant::now(),
            budget,
            token,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl Checkpoint for SampleBudget {
    fn check(&self) -> SsvkResult<()> {
        self.token.check()?;
        let elapsed = self.started.elapsed();
        if elapsed >= self.budget {
            return Err(SsvkError::TimedOut {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.budget.as_millis() as u64,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(SsvkError::Cancelled)));
    }

    #[test]
    fn test_zero_budget_trips_immediately() {
        let budget = SampleBudget::start(Duration::ZERO, CancellationToken::new());
        assert!(matches!(
            budget.check(),
            Err(SsvkError::TimedOut { budget_ms: 0, .. })
        ));
    }

    #[test]
    fn test_generous_budget_passes() {
        let budget = SampleBudget::start(Duration::from_secs(60), CancellationToken::new());
        assert!(budget.check().is_ok());
        assert_eq!(budget.budget(), Duration::from_secs(60));
    }

    #[test]
    fn test_cancellation_wins_over_budget() {
        let token = CancellationToken::new();
        let budget = SampleBudget::start(Duration::ZERO, token.clone());
        token.cancel();
        assert!(matches!(budget.check(), Err(SsvkError::Cancelled)));
    }
}
