// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Polynomial Unfolding Engine
// ─────────────────────────────────────────────────────────────────────
//! Maps a bulk spectrum to unit mean spacing by fitting a monotone
//! polynomial to the staircase N(λ) = rank(λ).
//!
//! Pipeline:
//!   1. drop |λ| < zero_threshold (trivial null modes)
//!   2. keep the fractional index window [bulk_lower, bulk_upper)
//!   3. least-squares fit of degree d ∈ [min_degree, max_degree] on λ
//!      rescaled to [-1, 1]; the first monotone fit with RMS residual
//!      below `residual_fraction · len` wins, otherwise the best
//!      monotone fit
//!   4. emit P(λ) at each bulk eigenvalue
//!
//! Post-condition: mean spacing within 1 ± mean_tolerance, else
//! `UnfoldingFailure`.

use nalgebra::{DMatrix, DVector};

use ssvk_types::{SsvkError, SsvkResult, UnfoldingConfig};

use crate::extract::bulk_window;

/// Output of a successful unfolding.
#[derive(Debug, Clone)]
pub struct UnfoldedSpectrum {
    /// P(λ_i) for each bulk eigenvalue, ascending.
    pub values: Vec<f64>,
    /// Chosen polynomial degree.
    pub degree: usize,
    /// RMS staircase residual of the chosen fit.
    pub residual: f64,
    pub bulk_lower: f64,
    pub bulk_upper: f64,
    /// Eigenvalues dropped as numerical zeros.
    pub discarded_zero_modes: usize,
}

impl UnfoldedSpectrum {
    /// Nearest-neighbour spacings, strictly positive ones only.
    pub fn spacings(&self) -> Vec<f64> {
        self.values
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|s| *s > 0.0)
            .collect()
    }

    /// Mean of all consecutive differences.
    pub fn mean_spacing(&self) -> f64 {
        match (self.values.first(), self.values.last()) {
            (Some(a), Some(b)) if self.values.len() > 1 => (b - a) / (self.values.len() - 1) as f64,
            _ => 0.0,
        }
    }
}

/// A fitted staircase polynomial in the rescaled variable.
struct StaircaseFit {
    coeffs: Vec<f64>,
    residual: f64,
}

impl StaircaseFit {
    fn eval(&self, u: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * u + c)
    }

    fn derivative(&self, u: f64) -> f64 {
        self.coeffs
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (k, c)| acc * u + k as f64 * c)
    }

    fn is_monotone_on(&self, us: &[f64]) -> bool {
        us.iter().all(|&u| self.derivative(u) > 0.0)
    }
}

/// Polynomial unfolding under a fixed configuration.
#[derive(Debug, Clone)]
pub struct Unfolder {
    cfg: UnfoldingConfig,
}

impl Default for Unfolder {
    fn default() -> Self {
        Self {
            cfg: UnfoldingConfig::default(),
        }
    }
}

impl Unfolder {
    pub fn new(cfg: UnfoldingConfig) -> SsvkResult<Self> {
        if cfg.min_degree == 0 || cfg.min_degree > cfg.max_degree {
            return Err(SsvkError::InvalidParameters(format!(
                "unfolding degrees must satisfy 1 <= min <= max, got {}..={}",
                cfg.min_degree, cfg.max_degree
            )));
        }
        bulk_window(0, cfg.bulk_lower, cfg.bulk_upper)?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &UnfoldingConfig {
        &self.cfg
    }

    /// Unfold an ascending spectrum.
    pub fn unfold(&self, eigenvalues: &[f64]) -> SsvkResult<UnfoldedSpectrum> {
        let cfg = &self.cfg;
        if eigenvalues.iter().any(|v| !v.is_finite()) {
            return Err(SsvkError::UnfoldingFailure(
                "spectrum contains non-finite eigenvalues".to_string(),
            ));
        }
        let nonzero: Vec<f64> = eigenvalues
            .iter()
            .copied()
            .filter(|v| v.abs() >= cfg.zero_threshold)
            .collect();
        let discarded = eigenvalues.len() - nonzero.len();
        if nonzero.windows(2).any(|w| w[1] < w[0]) {
            return Err(SsvkError::UnfoldingFailure(
                "spectrum is not sorted ascending".to_string(),
            ));
        }

        let (a, b) = bulk_window(nonzero.len(), cfg.bulk_lower, cfg.bulk_upper)?;
        let bulk = &nonzero[a..b];
        let len = bulk.len();
        if len < cfg.min_degree + 2 {
            return Err(SsvkError::UnfoldingFailure(format!(
                "bulk holds {len} eigenvalues, need at least {}",
                cfg.min_degree + 2
            )));
        }
        let (lo, hi) = (bulk[0], bulk[len - 1]);
        let half = 0.5 * (hi - lo);
        if !(half > f64::EPSILON * lo.abs().max(hi.abs()).max(1.0)) {
            return Err(SsvkError::UnfoldingFailure(format!(
                "degenerate bulk: all {len} eigenvalues within [{lo}, {hi}]"
            )));
        }
        let mid = 0.5 * (hi + lo);
        let us: Vec<f64> = bulk.iter().map(|x| (x - mid) / half).collect();
        let ranks: Vec<f64> = (a..b).map(|r| r as f64).collect();

        let accept = cfg.residual_fraction * len as f64;
        let mut chosen: Option<(usize, StaircaseFit)> = None;
        for degree in cfg.min_degree..=cfg.max_degree {
            if len < degree + 2 {
                break;
            }
            let fit = fit_staircase(&us, &ranks, degree)?;
            if !fit.is_monotone_on(&us) {
                log::debug!("unfold: degree {degree} fit is not monotone on the bulk");
                continue;
            }
            let good = fit.residual < accept;
            let better = chosen
                .as_ref()
                .map_or(true, |(_, best)| fit.residual < best.residual);
            if good {
                chosen = Some((degree, fit));
                break;
            }
            if better {
                chosen = Some((degree, fit));
            }
        }
        let (degree, fit) = chosen.ok_or_else(|| {
            SsvkError::UnfoldingFailure(format!(
                "no monotone staircase fit for degrees {}..={}",
                cfg.min_degree, cfg.max_degree
            ))
        })?;
        log::debug!(
            "unfold: {len} bulk levels, degree {degree}, rms residual {:.4}",
            fit.residual
        );

        let unfolded = UnfoldedSpectrum {
            values: us.iter().map(|&u| fit.eval(u)).collect(),
            degree,
            residual: fit.residual,
            bulk_lower: cfg.bulk_lower,
            bulk_upper: cfg.bulk_upper,
            discarded_zero_modes: discarded,
        };
        let mean = unfolded.mean_spacing();
        if !((mean - 1.0).abs() <= cfg.mean_tolerance) {
            return Err(SsvkError::UnfoldingFailure(format!(
                "unfolded mean spacing {mean:.4} outside 1 ± {}",
                cfg.mean_tolerance
            )));
        }
        Ok(unfolded)
    }
}

/// Unfold with an explicit configuration.
pub fn unfold(eigenvalues: &[f64], cfg: &UnfoldingConfig) -> SsvkResult<UnfoldedSpectrum> {
    Unfolder::new(cfg.clone())?.unfold(eigenvalues)
}

/// Least-squares polynomial of `degree` through (u_i, y_i) via SVD.
fn fit_staircase(us: &[f64], ys: &[f64], degree: usize) -> SsvkResult<StaircaseFit> {
    let vander = DMatrix::from_fn(us.len(), degree + 1, |i, j| us[i].powi(j as i32));
    let rhs = DVector::from_column_slice(ys);
    let coeffs = vander
        .clone()
        .svd(true, true)
        .solve(&rhs, 1e-12)
        .map_err(|e| SsvkError::UnfoldingFailure(format!("degree {degree} fit: {e}")))?;
    let residual = ((&vander * &coeffs - &rhs).norm_squared() / us.len() as f64).sqrt();
    Ok(StaircaseFit {
        coeffs: coeffs.iter().copied().collect(),
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Semicircle quantiles: eigenvalue positions of a "perfectly rigid"
    /// Wigner spectrum of radius 2.
    fn semicircle_levels(n: usize) -> Vec<f64> {
        (0..n)
            .map(|k| {
                let target = (k as f64 + 0.5) / n as f64;
                let (mut lo, mut hi) = (-2.0_f64, 2.0_f64);
                for _ in 0..80 {
                    let x = 0.5 * (lo + hi);
                    let cdf = 0.5
                        + (x * (4.0 - x * x).sqrt() / 4.0 + (x / 2.0).asin())
                            / std::f64::consts::PI;
                    if cdf < target {
                        lo = x;
                    } else {
                        hi = x;
                    }
                }
                0.5 * (lo + hi)
            })
            .collect()
    }

    #[test]
    fn test_uniform_levels_unfold_to_unit_spacing() {
        let levels: Vec<f64> = (1..=200).map(|i| 0.37 * i as f64).collect();
        let u = Unfolder::default().unfold(&levels).unwrap();
        assert_eq!(u.degree, 3);
        assert_abs_diff_eq!(u.mean_spacing(), 1.0, epsilon = 1e-9);
        assert!(u.spacings().iter().all(|s| (s - 1.0).abs() < 1e-8));
    }

    #[test]
    fn test_semicircle_mean_spacing() {
        let levels = semicircle_levels(400);
        let u = Unfolder::default().unfold(&levels).unwrap();
        assert!(
            (u.mean_spacing() - 1.0).abs() <= 0.05,
            "mean spacing {}",
            u.mean_spacing()
        );
        assert_eq!(u.values.len(), 280);
        assert!((3..=5).contains(&u.degree));
    }

    #[test]
    fn test_zero_modes_discarded() {
        let mut levels = vec![0.0, 1e-7, -2e-6];
        levels.extend((1..=100).map(|i| i as f64));
        levels.sort_by(f64::total_cmp);
        let u = Unfolder::default().unfold(&levels).unwrap();
        assert_eq!(u.discarded_zero_modes, 3);
    }

    #[test]
    fn test_degenerate_spectrum_fails() {
        let levels = vec![2.5; 100];
        assert!(matches!(
            Unfolder::default().unfold(&levels),
            Err(SsvkError::UnfoldingFailure(_))
        ));
    }

    #[test]
    fn test_too_few_levels_fail() {
        let levels = [1.0, 2.0, 3.0, 4.0];
        assert!(matches!(
            Unfolder::default().unfold(&levels),
            Err(SsvkError::UnfoldingFailure(_))
        ));
    }

    #[test]
    fn test_non_finite_levels_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let mut levels: Vec<f64> = (1..=100).map(f64::from).collect();
            levels.push(bad);
            assert!(matches!(
                Unfolder::default().unfold(&levels),
                Err(SsvkError::UnfoldingFailure(_))
            ));
        }
    }

    #[test]
    fn test_unsorted_rejected() {
        let mut levels: Vec<f64> = (1..=50).map(f64::from).collect();
        levels.swap(10, 30);
        assert!(Unfolder::default().unfold(&levels).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let cfg = UnfoldingConfig {
            min_degree: 5,
            max_degree: 3,
            ..UnfoldingConfig::default()
        };
        assert!(Unfolder::new(cfg).is_err());
    }
}
