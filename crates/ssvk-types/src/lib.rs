// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Spectral Validation Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy shared by every
//! stage of the spectral validation kernel (graph builder, spectrum
//! extractor, unfolding engine, classifier, evolver, orchestrator).

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod record;

pub use checkpoint::{Checkpoint, Unbounded};
pub use config::{ClassifierConfig, EvolverConfig, SsvkConfig, Tolerances, UnfoldingConfig};
pub use error::{SsvkError, SsvkResult};
pub use record::{ExperimentResult, SampleStatus, SpacingLabel, SpectrumSummary};
