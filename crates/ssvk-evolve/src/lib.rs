// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Entropic Evolution
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Graph rewiring under entropic pressure: single-edge flips in batches,
//! scored by the von Neumann entropy of the Laplacian spectrum and
//! accepted with a Metropolis rule at inverse temperature β.

pub mod entropy;
pub mod evolver;

pub use entropy::{graph_entropy, spectral_entropy};
pub use evolver::{EntropicEvolver, EvolutionOutcome, EvolutionStep};
