// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Spectral Statistics Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Spectrum extraction, unfolding, and level-spacing classification.
//!
//! Stages:
//!   - `extract`: dense (nalgebra) and Lanczos eigenvalue extraction
//!   - `unfold`: adaptive polynomial staircase unfolding
//!   - `classify`: histogram fit against Poisson / GOE / GUE surmises
//!
//! `jacobi` and `lanczos` are the small-matrix and Krylov kernels the
//! extractor is built on.

pub mod classify;
pub mod extract;
pub mod jacobi;
pub mod lanczos;
pub mod unfold;

pub use classify::{
    goe_surmise, gue_surmise, mean_spacing_ratio, poisson_surmise, Classifier, SpacingHistogram,
    SpacingStatistics, SurmiseScores, GOE_MEAN_RATIO, GUE_MEAN_RATIO, POISSON_MEAN_RATIO,
};
pub use extract::{
    bulk_window, spectrum_bulk, spectrum_full, spectrum_lowest, Spectrum, SpectrumExtractor,
    GAP_FLOOR,
};
pub use lanczos::{lanczos_deflated, lanczos_lowest, LanczosOutcome};
pub use unfold::{unfold, UnfoldedSpectrum, Unfolder};
