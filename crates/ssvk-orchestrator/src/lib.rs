// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Experiment Orchestrator
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Parameter sweeps over the spectral validation pipeline.
//!
//! Layout:
//!   - `experiment`: per-sample pipelines (sat-gap, critical-instant,
//!     gue-surmise, geometric)
//!   - `critical`: random regular → evolver → classified spectrum
//!   - `sweep`: the orchestrator, seeds, deadlines, rayon workers
//!   - `cancel`: cancellation token and per-sample budgets
//!   - `thermal`: two-level fidelity overlay
//!   - `table` / `summary`: result rows, CSV/JSON export, exit codes
//!   - `plot`: PNG comparison figures

pub mod cancel;
pub mod critical;
pub mod experiment;
pub mod plot;
pub mod summary;
pub mod sweep;
pub mod table;
pub mod thermal;

pub use cancel::{CancellationToken, SampleBudget};
pub use critical::{critical_instant_spectrum, CriticalInstant, CRITICAL_DEGREE};
pub use experiment::{
    analyse_spectrum, ExperimentKind, SampleOutcome, SamplePipeline, SpectralAnalysis,
};
pub use summary::{
    SweepSummary, EXIT_ALL_FAILED, EXIT_INVALID_ARGUMENTS, EXIT_PARTIAL, EXIT_SUCCESS,
};
pub use sweep::{parse_n_range, run_id, GapSweep, Orchestrator, SweepPlan, SweepReport};
pub use table::{aggregate, GapRow, ResultTable, CSV_HEADER};
pub use thermal::{fidelity_curve, thermal_fidelity};
