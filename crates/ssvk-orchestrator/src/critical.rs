// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Critical Instant Spectrum
// ─────────────────────────────────────────────────────────────────────
//! Random regular graph → entropic evolution → full Laplacian spectrum
//! → unfolding → classification.

use rand::Rng;

use ssvk_evolve::{EntropicEvolver, EvolutionOutcome};
use ssvk_graph::{build_random_regular, OperatorKind, SymmetricOperator};
use ssvk_spectral::{Classifier, Spectrum, SpectrumExtractor, Unfolder};
use ssvk_types::{Checkpoint, EvolverConfig, SsvkConfig, SsvkResult};

use crate::experiment::{analyse_spectrum, SpectralAnalysis};

/// Degree of the starting random regular graph. Even, so every N works.
pub const CRITICAL_DEGREE: usize = 4;

/// Evolved graph with its classified Laplacian spectrum.
#[derive(Debug, Clone)]
pub struct CriticalInstant {
    pub evolution: EvolutionOutcome,
    pub spectrum: Spectrum,
    pub analysis: SpectralAnalysis,
}

/// Evolve a random 4-regular graph on `n` nodes for `steps` mutations at
/// inverse temperature `beta`, then classify its Laplacian spectrum.
///
/// Batch size, tolerances, and unfolding/classifier settings come from
/// `cfg`.
pub fn critical_instant_spectrum<R, C>(
    n: usize,
    steps: usize,
    beta: f64,
    cfg: &SsvkConfig,
    rng: &mut R,
    checkpoint: &C,
) -> SsvkResult<CriticalInstant>
where
    R: Rng + ?Sized,
    C: Checkpoint + ?Sized,
{
    let evolver = EntropicEvolver::new(
        EvolverConfig {
            steps,
            check_interval: cfg.evolver.check_interval,
            beta,
        },
        cfg.tolerances.clone(),
    )?;
    let start = build_random_regular(n, CRITICAL_DEGREE, rng)?;
    let evolution = evolver.evolve(start, rng, checkpoint)?;
    log::debug!(
        "critical instant n={n}: S {:.4} -> {:.4}, {} accepted / {} rejected",
        evolution.initial_entropy,
        evolution.final_entropy,
        evolution.accepted,
        evolution.rejected
    );

    checkpoint.check()?;
    let op = SymmetricOperator::from_graph(&evolution.graph, &OperatorKind::Laplacian)?;
    let spectrum = SpectrumExtractor::new(cfg.tolerances.clone()).full(&op)?;
    checkpoint.check()?;

    let unfolder = Unfolder::new(cfg.unfolding.clone())?;
    let classifier = Classifier::new(cfg.classifier.clone());
    let analysis = analyse_spectrum(&spectrum, &unfolder, &classifier)?;
    Ok(CriticalInstant {
        evolution,
        spectrum,
        analysis,
    })
}
