// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{SsvkError, SsvkResult};

/// Numerical tolerances for operator checks and eigensolvers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// Maximum relative asymmetry |A - A^H| / max|A| accepted as Hermitian.
    pub hermitian_rel: f64,

    /// Maximum relative eigendecomposition residual before a solve is
    /// declared a `NumericalBreakdown`.
    pub residual_rel: f64,

    /// Eigenvalues within this distance of zero count as null modes
    /// (connected components of a Laplacian).
    pub zero_mode: f64,

    /// Operators larger than this are solved with Lanczos when only a few
    /// lowest eigenvalues are requested.
    pub dense_cutoff: usize,

    /// Iteration cap for the dense symmetric eigensolver (0 = unbounded).
    pub max_eigen_iterations: usize,

    /// Krylov dimension padding on top of the requested eigenvalue count.
    pub lanczos_extra: usize,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            hermitian_rel: 1e-10,
            residual_rel: 1e-8,
            zero_mode: 1e-9,
            dense_cutoff: 1000,
            max_eigen_iterations: 0,
            lanczos_extra: 40,
        }
    }
}

/// Polynomial unfolding parameters.
///
/// Changing these changes classification outcomes; the orchestrator
/// copies the bulk window and chosen degree into every result record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnfoldingConfig {
    /// Lower fractional index of the bulk window. Default: 0.15.
    pub bulk_lower: f64,
    /// Upper fractional index of the bulk window. Default: 0.85.
    pub bulk_upper: f64,
    /// Smallest staircase polynomial degree tried. Default: 3.
    pub min_degree: usize,
    /// Largest staircase polynomial degree tried. Default: 5.
    pub max_degree: usize,
    /// |λ| below this is discarded as a trivial null mode. Default: 1e-5.
    pub zero_threshold: f64,
    /// Accept the first degree whose RMS staircase residual is below
    /// this fraction of the bulk size. Default: 0.01.
    pub residual_fraction: f64,
    /// Allowed deviation of the unfolded mean spacing from 1. Default: 0.05.
    pub mean_tolerance: f64,
}

impl Default for UnfoldingConfig {
    fn default() -> Self {
        Self {
            bulk_lower: 0.15,
            bulk_upper: 0.85,
            min_degree: 3,
            max_degree: 5,
            zero_threshold: 1e-5,
            residual_fraction: 0.01,
            mean_tolerance: 0.05,
        }
    }
}

/// Spacing classifier parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Histogram bins on [0, range]. Must lie in 30..=50. Default: 40.
    pub bins: usize,
    /// Upper edge of the histogram. Default: 3.0.
    pub range: f64,
    /// Spacings below this count towards the repulsion index. Default: 0.2.
    pub repulsion_cutoff: f64,
    /// Fewer valid spacings than this yields `inconclusive`. Default: 30.
    pub min_spacings: usize,
    /// Confidence below this yields `inconclusive`. Default: 0.05.
    pub min_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            bins: 40,
            range: 3.0,
            repulsion_cutoff: 0.2,
            min_spacings: 30,
            min_confidence: 0.05,
        }
    }
}

/// Entropic evolver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolverConfig {
    /// Total single-edge mutations. Default: 2000.
    pub steps: usize,
    /// Mutations per batch between entropy evaluations. Default: 50.
    pub check_interval: usize,
    /// Inverse temperature of the Metropolis acceptance. Default: 10.0.
    pub beta: f64,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            steps: 2000,
            check_interval: 50,
            beta: 10.0,
        }
    }
}

/// Runtime configuration threaded through every kernel layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SsvkConfig {
    /// Master seed. `None` opts out of reproducibility; the orchestrator
    /// then draws one from OS entropy and records it in every row.
    pub seed: Option<u64>,

    /// Directory for result tables and figures.
    pub out_dir: PathBuf,

    pub tolerances: Tolerances,
    pub unfolding: UnfoldingConfig,
    pub classifier: ClassifierConfig,
    pub evolver: EvolverConfig,

    /// Per-sample hard timeout in milliseconds. Default: 60 000.
    pub sample_timeout_ms: u64,

    /// Temperature of the thermal fidelity overlay. Default: 0.1.
    pub temperature: f64,

    /// Clause-to-variable ratio of random 3-SAT instances. Default: 4.26.
    pub sat_ratio: f64,

    /// Figure resolution. Must lie in 150..=300. Default: 150.
    pub figure_dpi: u32,

    /// Whether the orchestrator renders PNG figures.
    pub emit_figures: bool,
}

impl Default for SsvkConfig {
    fn default() -> Self {
        Self {
            seed: None,
            out_dir: PathBuf::from("ssvk-out"),
            tolerances: Tolerances::default(),
            unfolding: UnfoldingConfig::default(),
            classifier: ClassifierConfig::default(),
            evolver: EvolverConfig::default(),
            sample_timeout_ms: 60_000,
            temperature: 0.1,
            sat_ratio: 4.26,
            figure_dpi: 150,
            emit_figures: true,
        }
    }
}

impl SsvkConfig {
    /// Default configuration with an explicit seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> SsvkResult<()> {
        let u = &self.unfolding;
        if !(0.0..1.0).contains(&u.bulk_lower)
            || !(0.0..=1.0).contains(&u.bulk_upper)
            || u.bulk_lower >= u.bulk_upper
        {
            return Err(SsvkError::Config(format!(
                "bulk window must satisfy 0 <= lower < upper <= 1, got {}..{}",
                u.bulk_lower, u.bulk_upper
            )));
        }
        if u.min_degree < 1 || u.min_degree > u.max_degree {
            return Err(SsvkError::Config(format!(
                "unfolding degrees must satisfy 1 <= min <= max, got {}..={}",
                u.min_degree, u.max_degree
            )));
        }
        if u.mean_tolerance <= 0.0 || u.residual_fraction <= 0.0 {
            return Err(SsvkError::Config(
                "unfolding tolerances must be > 0".to_string(),
            ));
        }
        let c = &self.classifier;
        if !(30..=50).contains(&c.bins) {
            return Err(SsvkError::Config(format!(
                "classifier bins must be in 30..=50, got {}",
                c.bins
            )));
        }
        if !(c.range > 0.0) || !(c.repulsion_cutoff > 0.0) {
            return Err(SsvkError::Config(format!(
                "classifier range and repulsion cutoff must be > 0, got {} and {}",
                c.range, c.repulsion_cutoff
            )));
        }
        if !(0.0..1.0).contains(&c.min_confidence) {
            return Err(SsvkError::Config(format!(
                "min_confidence must be in [0, 1), got {}",
                c.min_confidence
            )));
        }
        let e = &self.evolver;
        if e.check_interval == 0 {
            return Err(SsvkError::Config(
                "evolver check_interval must be >= 1".to_string(),
            ));
        }
        if !(e.beta >= 0.0) || !e.beta.is_finite() {
            return Err(SsvkError::Config(format!(
                "evolver beta must be finite and >= 0, got {}",
                e.beta
            )));
        }
        let t = &self.tolerances;
        if !(t.hermitian_rel > 0.0) || !(t.residual_rel > 0.0) || !(t.zero_mode > 0.0) {
            return Err(SsvkError::Config(
                "tolerances must be > 0".to_string(),
            ));
        }
        if !(self.temperature >= 0.0) || !self.temperature.is_finite() {
            return Err(SsvkError::Config(format!(
                "temperature must be finite and >= 0, got {}",
                self.temperature
            )));
        }
        if !(self.sat_ratio > 0.0) || !self.sat_ratio.is_finite() {
            return Err(SsvkError::Config(format!(
                "sat_ratio must be finite and > 0, got {}",
                self.sat_ratio
            )));
        }
        if !(150..=300).contains(&self.figure_dpi) {
            return Err(SsvkError::Config(format!(
                "figure_dpi must be in 150..=300, got {}",
                self.figure_dpi
            )));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> SsvkResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| SsvkError::Config(format!("JSON parse error: {e}")))
    }
}
