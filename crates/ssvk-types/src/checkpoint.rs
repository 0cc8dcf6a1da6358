// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Cooperative Checkpoints
// ─────────────────────────────────────────────────────────────────────
//! Suspension points for long-running stages.
//!
//! The eigensolver and the entropic evolver call `check()` between
//! units of work; the orchestrator supplies an implementation that
//! trips on its per-sample deadline or on cancellation.

use crate::error::SsvkResult;

/// A cooperative cancellation/timeout probe.
pub trait Checkpoint {
    fn check(&self) -> SsvkResult<()>;
}

/// Checkpoint that never trips.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Checkpoint for Unbounded {
    #[inline]
    fn check(&self) -> SsvkResult<()> {
        Ok(())
    }
}

impl<C: Checkpoint + ?Sized> Checkpoint for &C {
    fn check(&self) -> SsvkResult<()> {
        (**self).check()
    }
}
