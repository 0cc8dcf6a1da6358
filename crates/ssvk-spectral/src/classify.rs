// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Level-Spacing Classifier
// ─────────────────────────────────────────────────────────────────────
//! Nearest-neighbour spacing statistics against the three reference
//! surmises:
//!
//!   Poisson:  P(s) = exp(−s)
//!   GOE:      P(s) = (π/2)·s·exp(−π s²/4)
//!   GUE:      P(s) = (32/π²)·s²·exp(−4 s²/π)
//!
//! The empirical density is binned on [0, range]; each surmise scores
//! the squared residual at the bin centres and the smallest wins.
//! Confidence = 1 − best/second_best. The classifier never fails:
//! ambiguous input yields `Inconclusive` with a diagnostic.
//!
//! The consecutive-spacing ratio ⟨r⟩ = ⟨min(s_i, s_{i+1}) / max(s_i, s_{i+1})⟩
//! is reported alongside; it needs no unfolding.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use ssvk_types::{ClassifierConfig, SpacingLabel};

use crate::unfold::UnfoldedSpectrum;

/// ⟨r⟩ for uncorrelated levels: 2 ln 2 − 1.
pub const POISSON_MEAN_RATIO: f64 = 0.386_294_361_119_890_6;
/// ⟨r⟩ for the orthogonal ensemble.
pub const GOE_MEAN_RATIO: f64 = 0.5307;
/// ⟨r⟩ for the unitary ensemble.
pub const GUE_MEAN_RATIO: f64 = 0.5996;

#[inline]
pub fn poisson_surmise(s: f64) -> f64 {
    (-s).exp()
}

#[inline]
pub fn goe_surmise(s: f64) -> f64 {
    0.5 * PI * s * (-0.25 * PI * s * s).exp()
}

#[inline]
pub fn gue_surmise(s: f64) -> f64 {
    32.0 / (PI * PI) * s * s * (-4.0 * s * s / PI).exp()
}

/// Candidates in tie-break order (simplest hypothesis first).
const CANDIDATES: [(SpacingLabel, fn(f64) -> f64); 3] = [
    (SpacingLabel::Poisson, poisson_surmise),
    (SpacingLabel::Goe, goe_surmise),
    (SpacingLabel::Gue, gue_surmise),
];

/// Normalised spacing histogram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingHistogram {
    pub bin_width: f64,
    pub centres: Vec<f64>,
    /// count / (total · bin_width); spacings beyond the range still count
    /// in the total.
    pub density: Vec<f64>,
}

/// Squared residual against each surmise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SurmiseScores {
    pub poisson: f64,
    pub goe: f64,
    pub gue: f64,
}

impl SurmiseScores {
    pub fn get(&self, label: SpacingLabel) -> Option<f64> {
        match label {
            SpacingLabel::Poisson => Some(self.poisson),
            SpacingLabel::Goe => Some(self.goe),
            SpacingLabel::Gue => Some(self.gue),
            SpacingLabel::Inconclusive => None,
        }
    }
}

/// Summary statistics and verdict for one spacing sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingStatistics {
    /// Valid (strictly positive, finite) spacings.
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    /// Fraction of spacings below the repulsion cutoff.
    pub repulsion_index: f64,
    /// `repulsion_index` over its Poisson expectation 1 − e^{−cutoff}.
    pub relative_repulsion: f64,
    pub mean_ratio: Option<f64>,
    pub histogram: Option<SpacingHistogram>,
    pub scores: Option<SurmiseScores>,
    pub label: SpacingLabel,
    pub confidence: f64,
    pub diagnostic: Option<String>,
}

/// ⟨r⟩ over consecutive spacing pairs, skipping pairs with a zero member.
pub fn mean_spacing_ratio(spacings: &[f64]) -> Option<f64> {
    let (sum, count) = spacings
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .fold((0.0, 0usize), |(s, c), w| {
            (s + w[0].min(w[1]) / w[0].max(w[1]), c + 1)
        });
    (count > 0).then(|| sum / count as f64)
}

/// Histogram classifier under a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    cfg: ClassifierConfig,
}

impl Classifier {
    pub fn new(cfg: ClassifierConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.cfg
    }

    /// Classify the spacings of an unfolded spectrum.
    pub fn classify(&self, unfolded: &UnfoldedSpectrum) -> SpacingStatistics {
        self.classify_spacings(&unfolded.spacings())
    }

    /// Classify a raw spacing sequence. Non-positive and non-finite
    /// entries are dropped.
    pub fn classify_spacings(&self, raw: &[f64]) -> SpacingStatistics {
        let cfg = &self.cfg;
        let spacings: Vec<f64> = raw
            .iter()
            .copied()
            .filter(|s| s.is_finite() && *s > 0.0)
            .collect();
        let count = spacings.len();
        let mut stats = SpacingStatistics {
            count,
            mean: 0.0,
            std: 0.0,
            repulsion_index: 0.0,
            relative_repulsion: 0.0,
            mean_ratio: mean_spacing_ratio(&spacings),
            histogram: None,
            scores: None,
            label: SpacingLabel::Inconclusive,
            confidence: 0.0,
            diagnostic: None,
        };
        if count == 0 {
            stats.diagnostic = Some("no positive spacings".to_string());
            return stats;
        }

        let n = count as f64;
        stats.mean = spacings.iter().sum::<f64>() / n;
        stats.std = (spacings.iter().map(|s| (s - stats.mean).powi(2)).sum::<f64>() / n).sqrt();
        let below = spacings.iter().filter(|&&s| s < cfg.repulsion_cutoff).count();
        stats.repulsion_index = below as f64 / n;
        let poisson_expect = 1.0 - (-cfg.repulsion_cutoff).exp();
        if poisson_expect > 0.0 {
            stats.relative_repulsion = stats.repulsion_index / poisson_expect;
        }

        if count < cfg.min_spacings {
            stats.diagnostic = Some(format!(
                "{count} valid spacings, need at least {}",
                cfg.min_spacings
            ));
            return stats;
        }
        if cfg.bins == 0 || !(cfg.range > 0.0) {
            stats.diagnostic = Some(format!(
                "histogram needs bins > 0 and range > 0, got {} on [0, {}]",
                cfg.bins, cfg.range
            ));
            return stats;
        }

        let histogram = build_histogram(&spacings, cfg.bins, cfg.range);
        let residuals: Vec<f64> = CANDIDATES
            .iter()
            .map(|(_, p)| {
                histogram
                    .centres
                    .iter()
                    .zip(&histogram.density)
                    .map(|(&c, &d)| (d - p(c)).powi(2))
                    .sum()
            })
            .collect();
        stats.scores = Some(SurmiseScores {
            poisson: residuals[0],
            goe: residuals[1],
            gue: residuals[2],
        });
        stats.histogram = Some(histogram);

        let order = rank_candidates(&residuals);
        let (best, second) = (residuals[order[0]], residuals[order[1]]);
        stats.confidence = if second > 0.0 { 1.0 - best / second } else { 0.0 };

        let winner = CANDIDATES[order[0]].0;
        if stats.confidence < cfg.min_confidence {
            stats.diagnostic = Some(format!(
                "best fit {winner} only {:.3} ahead of {}",
                stats.confidence, CANDIDATES[order[1]].0
            ));
        } else {
            stats.label = winner;
        }
        stats
    }
}

/// Candidate indices by ascending residual; equal residuals keep the
/// Poisson > GOE > GUE preference.
fn rank_candidates(residuals: &[f64]) -> [usize; 3] {
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| residuals[a].total_cmp(&residuals[b]).then(a.cmp(&b)));
    order
}

/// Density histogram of `spacings` on [0, range) with `bins` bins.
fn build_histogram(spacings: &[f64], bins: usize, range: f64) -> SpacingHistogram {
    let width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for &s in spacings {
        if s < range {
            let b = ((s / width) as usize).min(bins - 1);
            counts[b] += 1;
        }
    }
    let norm = spacings.len() as f64 * width;
    SpacingHistogram {
        bin_width: width,
        centres: (0..bins).map(|i| (i as f64 + 0.5) * width).collect(),
        density: counts.iter().map(|&c| c as f64 / norm).collect(),
    }
}
