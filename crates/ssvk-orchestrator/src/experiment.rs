// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Experiment Pipelines
// ─────────────────────────────────────────────────────────────────────
//! One sweep sample, start to finish:
//!
//!   seed → build operator → extract spectrum → (unfold → classify)
//!
//! Every experiment names the operator it diagonalises. Gap-only
//! experiments skip unfolding and classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use ssvk_graph::{
    build_geometric, build_gue, percolation_radius, random_sat_instance, seeded_rng,
    OperatorKind, SymmetricOperator,
};
use ssvk_spectral::{
    Classifier, SpacingStatistics, Spectrum, SpectrumExtractor, UnfoldedSpectrum, Unfolder,
};
use ssvk_types::{Checkpoint, SampleStatus, SsvkConfig, SsvkError, SsvkResult};

use crate::critical::{critical_instant_spectrum, CRITICAL_DEGREE};
use crate::thermal::thermal_fidelity;

/// Radius of the geometric experiment, in units of the percolation radius.
pub const GEOMETRIC_RADIUS_FACTOR: f64 = 1.5;

/// Experiments the orchestrator can sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentKind {
    /// Random 3-SAT at the configured clause ratio; gap of L + diag(h).
    SatGap,
    /// Random regular graph evolved under entropic pressure, then
    /// classified.
    CriticalInstant,
    /// GUE matrix, classified against the surmises.
    GueSurmise,
    /// Random geometric graph above the percolation radius.
    Geometric,
}

impl ExperimentKind {
    pub const ALL: [ExperimentKind; 4] = [
        ExperimentKind::SatGap,
        ExperimentKind::CriticalInstant,
        ExperimentKind::GueSurmise,
        ExperimentKind::Geometric,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ExperimentKind::SatGap => "sat-gap",
            ExperimentKind::CriticalInstant => "critical-instant",
            ExperimentKind::GueSurmise => "gue-surmise",
            ExperimentKind::Geometric => "geometric",
        }
    }

    /// Whether samples go through unfolding and classification.
    pub fn classifies(&self) -> bool {
        !matches!(self, ExperimentKind::SatGap)
    }

    /// Smallest problem size the builders accept.
    pub fn min_n(&self) -> usize {
        match self {
            ExperimentKind::SatGap => 3,
            ExperimentKind::CriticalInstant => CRITICAL_DEGREE + 1,
            ExperimentKind::GueSurmise | ExperimentKind::Geometric => 2,
        }
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExperimentKind {
    type Err = SsvkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.id() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.id()).collect();
                SsvkError::InvalidParameters(format!(
                    "unknown experiment '{s}', expected one of {}",
                    known.join(", ")
                ))
            })
    }
}

/// Unfolding and classification of one spectrum.
#[derive(Debug, Clone)]
pub struct SpectralAnalysis {
    /// `None` when unfolding failed; the statistics then carry the
    /// failure as an inconclusive diagnostic.
    pub unfolded: Option<UnfoldedSpectrum>,
    pub statistics: SpacingStatistics,
}

/// Unfold and classify. Unfolding failures become an inconclusive
/// verdict; any other error propagates.
pub fn analyse_spectrum(
    spectrum: &Spectrum,
    unfolder: &Unfolder,
    classifier: &Classifier,
) -> SsvkResult<SpectralAnalysis> {
    match unfolder.unfold(spectrum.values()) {
        Ok(unfolded) => {
            let statistics = classifier.classify(&unfolded);
            Ok(SpectralAnalysis {
                unfolded: Some(unfolded),
                statistics,
            })
        }
        Err(SsvkError::UnfoldingFailure(msg)) => {
            log::debug!("unfolding failed: {msg}");
            let mut statistics = classifier.classify_spacings(&[]);
            statistics.diagnostic = Some(format!("unfolding failure: {msg}"));
            Ok(SpectralAnalysis {
                unfolded: None,
                statistics,
            })
        }
        Err(e) => Err(e),
    }
}

/// Everything one sample produced.
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    pub operator: &'static str,
    pub spectrum: Spectrum,
    pub gap: Option<f64>,
    pub analysis: Option<SpectralAnalysis>,
    pub fidelity: Option<f64>,
}

impl SampleOutcome {
    pub fn status(&self) -> SampleStatus {
        match &self.analysis {
            Some(a) if !a.statistics.label.is_conclusive() => SampleStatus::Inconclusive,
            _ => SampleStatus::Completed,
        }
    }
}

/// Configured extractor, unfolder and classifier, shared by every
/// sample of a sweep.
#[derive(Debug, Clone)]
pub struct SamplePipeline {
    cfg: SsvkConfig,
    extractor: SpectrumExtractor,
    unfolder: Unfolder,
    classifier: Classifier,
}

impl SamplePipeline {
    pub fn new(cfg: &SsvkConfig) -> SsvkResult<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            extractor: SpectrumExtractor::new(cfg.tolerances.clone()),
            unfolder: Unfolder::new(cfg.unfolding.clone())?,
            classifier: Classifier::new(cfg.classifier.clone()),
        })
    }

    pub fn extractor(&self) -> &SpectrumExtractor {
        &self.extractor
    }

    /// Run one sample of `kind` at size `n` from `seed`, probing
    /// `checkpoint` between stages.
    pub fn run<C: Checkpoint + ?Sized>(
        &self,
        kind: ExperimentKind,
        n: usize,
        seed: u64,
        checkpoint: &C,
    ) -> SsvkResult<SampleOutcome> {
        if n < kind.min_n() {
            return Err(SsvkError::InvalidParameters(format!(
                "{kind} needs N >= {}, got {n}",
                kind.min_n()
            )));
        }
        let mut rng = seeded_rng(seed);

        let (operator, spectrum, analysis) = match kind {
            ExperimentKind::SatGap => {
                let instance = random_sat_instance(n, self.cfg.sat_ratio, &mut rng)?;
                let graph = instance.to_graph()?;
                let op_kind = OperatorKind::BiasedLaplacian;
                let op = SymmetricOperator::from_graph(&graph, &op_kind)?;
                checkpoint.check()?;
                let spectrum = self.extractor.lowest_with(&op, 2, checkpoint)?;
                (op_kind.name(), spectrum, None)
            }
            ExperimentKind::GueSurmise => {
                let op = SymmetricOperator::Hermitian(build_gue(n, &mut rng)?);
                checkpoint.check()?;
                let spectrum = self.extractor.full(&op)?;
                checkpoint.check()?;
                let analysis = analyse_spectrum(&spectrum, &self.unfolder, &self.classifier)?;
                (op.kind_name(), spectrum, Some(analysis))
            }
            ExperimentKind::Geometric => {
                let radius = GEOMETRIC_RADIUS_FACTOR * percolation_radius(n);
                let graph = build_geometric(n, radius, &mut rng)?;
                let op_kind = OperatorKind::Laplacian;
                let op = SymmetricOperator::from_graph(&graph, &op_kind)?;
                checkpoint.check()?;
                let spectrum = self.extractor.full(&op)?;
                checkpoint.check()?;
                let analysis = analyse_spectrum(&spectrum, &self.unfolder, &self.classifier)?;
                (op_kind.name(), spectrum, Some(analysis))
            }
            ExperimentKind::CriticalInstant => {
                let evolver = &self.cfg.evolver;
                let critical = critical_instant_spectrum(
                    n,
                    evolver.steps,
                    evolver.beta,
                    &self.cfg,
                    &mut rng,
                    checkpoint,
                )?;
                (
                    OperatorKind::Laplacian.name(),
                    critical.spectrum,
                    Some(critical.analysis),
                )
            }
        };
        checkpoint.check()?;

        let gap = spectrum.gap();
        let fidelity = gap
            .map(|g| thermal_fidelity(g, self.cfg.temperature))
            .transpose()?;
        Ok(SampleOutcome {
            operator,
            spectrum,
            gap,
            analysis,
            fidelity,
        })
    }
}
