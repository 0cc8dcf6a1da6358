// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Spectrum Extractor
// ─────────────────────────────────────────────────────────────────────
//! Real spectra of symmetric operators.
//!
//! Dense solves go through nalgebra's `SymmetricEigen` (real symmetric
//! and complex Hermitian alike) followed by a reconstruction residual
//! check. Lowest-k requests on large sparse operators use deflated
//! Lanczos restarts, so repeated eigenvalues keep their multiplicity, and
//! fall back to the dense path when the Ritz residuals are too large.

use nalgebra::{ComplexField, DMatrix, SymmetricEigen};

use ssvk_graph::{DenseView, SymmetricOperator};
use ssvk_types::{Checkpoint, SpectrumSummary, SsvkError, SsvkResult, Tolerances, Unbounded};

use crate::lanczos::lanczos_deflated;

/// Floor applied to spectral gaps so downstream logarithms stay finite.
pub const GAP_FLOOR: f64 = 1e-9;

/// Fixed start-vector seed so Lanczos runs are reproducible.
const LANCZOS_SEED: u64 = 0x5353_564B_4C41_4E43;

/// Lower bound on deflated Lanczos restarts before the dense fallback.
const MAX_LANCZOS_ROUNDS: usize = 8;

/// Eigenvalues sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    values: Vec<f64>,
}

impl Spectrum {
    /// Wrap eigenvalues, sorting them ascending.
    pub fn new(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// λ₁ − λ₀, floored at [`GAP_FLOOR`].
    pub fn gap(&self) -> Option<f64> {
        match self.values.as_slice() {
            [l0, l1, ..] => Some((l1 - l0).max(GAP_FLOOR)),
            _ => None,
        }
    }

    /// Second-smallest eigenvalue (algebraic connectivity for a Laplacian).
    pub fn fiedler_value(&self) -> Option<f64> {
        self.values.get(1).copied()
    }

    /// Eigenvalues with |λ| ≤ eps.
    pub fn zero_modes(&self, eps: f64) -> usize {
        self.values.iter().filter(|v| v.abs() <= eps).count()
    }

    /// The `k` smallest eigenvalues.
    pub fn lowest(&self, k: usize) -> &[f64] {
        &self.values[..k.min(self.values.len())]
    }

    /// Eigenvalues in the fractional index window [lower, upper).
    pub fn bulk(&self, lower: f64, upper: f64) -> SsvkResult<&[f64]> {
        let (a, b) = bulk_window(self.values.len(), lower, upper)?;
        Ok(&self.values[a..b])
    }

    pub fn summary(&self, zero_eps: f64) -> SpectrumSummary {
        SpectrumSummary {
            len: self.len(),
            min: self.min().unwrap_or(0.0),
            max: self.max().unwrap_or(0.0),
            gap: self.gap().unwrap_or(GAP_FLOOR),
            zero_modes: self.zero_modes(zero_eps),
        }
    }
}

/// Index range [⌊n·lower⌋, ⌈n·upper⌉) of a fractional window.
pub fn bulk_window(n: usize, lower: f64, upper: f64) -> SsvkResult<(usize, usize)> {
    if !(0.0..1.0).contains(&lower) || !(lower < upper && upper <= 1.0) {
        return Err(SsvkError::InvalidParameters(format!(
            "bulk window must satisfy 0 <= lower < upper <= 1, got [{lower}, {upper}]"
        )));
    }
    let a = ((n as f64) * lower).floor() as usize;
    let b = (((n as f64) * upper).ceil() as usize).min(n);
    Ok((a.min(b), b))
}

/// Dense and sparse eigenvalue extraction under fixed tolerances.
#[derive(Debug, Clone, Default)]
pub struct SpectrumExtractor {
    tol: Tolerances,
}

impl SpectrumExtractor {
    pub fn new(tol: Tolerances) -> Self {
        Self { tol }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tol
    }

    /// All eigenvalues, ascending, via the dense solver.
    pub fn full(&self, op: &SymmetricOperator) -> SsvkResult<Spectrum> {
        op.check_hermitian(self.tol.hermitian_rel)?;
        let values = match op.dense_view() {
            DenseView::Real(m) => dense_eigenvalues(m.into_owned(), &self.tol)?,
            DenseView::Complex(m) => dense_eigenvalues(m.clone(), &self.tol)?,
        };
        Ok(Spectrum::new(values))
    }

    /// The `k` smallest eigenvalues.
    pub fn lowest(&self, op: &SymmetricOperator, k: usize) -> SsvkResult<Spectrum> {
        self.lowest_with(op, k, &Unbounded)
    }

    /// As [`lowest`](Self::lowest), probing `checkpoint` between Krylov steps.
    pub fn lowest_with<C: Checkpoint + ?Sized>(
        &self,
        op: &SymmetricOperator,
        k: usize,
        checkpoint: &C,
    ) -> SsvkResult<Spectrum> {
        let n = op.dim();
        if k == 0 || k > n {
            return Err(SsvkError::InvalidParameters(format!(
                "requested {k} lowest eigenvalues of a {n}x{n} operator"
            )));
        }

        if op.as_csr().is_some() && n > self.tol.dense_cutoff {
            op.check_hermitian(self.tol.hermitian_rel)?;
            match self.locked_lanczos(op, k, checkpoint) {
                Ok(Some(values)) => return Ok(Spectrum::new(values)),
                Ok(None) => {}
                Err(e @ (SsvkError::TimedOut { .. } | SsvkError::Cancelled)) => return Err(e),
                Err(e) => log::debug!("lanczos n={n} k={k} failed ({e}), dense fallback"),
            }
        }

        checkpoint.check()?;
        let full = self.full(op)?;
        Ok(Spectrum::new(full.lowest(k).to_vec()))
    }

    /// Lowest `k` eigenvalues by repeated deflated Lanczos runs.
    ///
    /// Converged Ritz pairs are locked after each run and the next run is
    /// started in their orthogonal complement, so every copy of a repeated
    /// eigenvalue is found. The result stands once a run's lowest converged
    /// Ritz value is no smaller than the k-th locked value. `None` means the
    /// dense path should take over.
    fn locked_lanczos<C: Checkpoint + ?Sized>(
        &self,
        op: &SymmetricOperator,
        k: usize,
        checkpoint: &C,
    ) -> SsvkResult<Option<Vec<f64>>> {
        let n = op.dim();
        let krylov = k + self.tol.lanczos_extra;
        let mut locked_values: Vec<f64> = Vec::new();
        let mut locked_vectors: Vec<Vec<f64>> = Vec::new();

        for round in 0..MAX_LANCZOS_ROUNDS.max(k + 1) {
            let seed = LANCZOS_SEED.wrapping_add(round as u64);
            let out = lanczos_deflated(op, k, krylov, seed, &locked_vectors, checkpoint)?;
            let scale = out
                .values
                .iter()
                .chain(&locked_values)
                .fold(1.0_f64, |m, v| m.max(v.abs()));
            let accept = self.tol.residual_rel.sqrt() * scale;

            if locked_values.len() >= k {
                let mut sorted = locked_values.clone();
                sorted.sort_by(f64::total_cmp);
                let kth = sorted[k - 1];
                let confirmed = match (out.values.first(), out.residuals.first()) {
                    (None, _) => true,
                    (Some(&v), Some(&r)) => r <= accept && v >= kth - accept,
                    (Some(_), None) => false,
                };
                if confirmed {
                    log::debug!("lanczos n={n} k={k}: confirmed after {} rounds", round + 1);
                    sorted.truncate(k);
                    return Ok(Some(sorted));
                }
            }

            let (max_residual, steps) = (out.max_residual(), out.iterations);
            let before = locked_values.len();
            for ((value, residual), vector) in out
                .values
                .iter()
                .zip(&out.residuals)
                .zip(out.vectors)
            {
                if *residual <= accept {
                    locked_values.push(*value);
                    locked_vectors.push(vector);
                }
            }
            if locked_values.len() == before {
                log::debug!(
                    "lanczos n={n} k={k}: residual {max_residual:.3e} after {steps} steps, \
                     dense fallback"
                );
                return Ok(None);
            }
        }
        log::debug!("lanczos n={n} k={k}: round cap reached, dense fallback");
        Ok(None)
    }

    /// Eigenvalues in the fractional index window of the full spectrum.
    pub fn bulk(&self, op: &SymmetricOperator, lower: f64, upper: f64) -> SsvkResult<Vec<f64>> {
        bulk_window(op.dim(), lower, upper)?;
        Ok(self.full(op)?.bulk(lower, upper)?.to_vec())
    }
}

/// All eigenvalues of a dense operator, with the imaginary parts of a
/// Hermitian input dropped by construction.
fn dense_eigenvalues<T>(m: DMatrix<T>, tol: &Tolerances) -> SsvkResult<Vec<f64>>
where
    T: ComplexField<RealField = f64>,
{
    let scale = m.iter().fold(0.0_f64, |a, z| a.max(z.clone().modulus()));
    let eig = SymmetricEigen::try_new(m.clone(), f64::EPSILON, tol.max_eigen_iterations)
        .ok_or_else(|| {
            SsvkError::NumericalBreakdown(format!(
                "dense eigensolver did not converge (n={})",
                m.nrows()
            ))
        })?;

    let defect = (&m - eig.recompose())
        .iter()
        .fold(0.0_f64, |a, z| a.max(z.clone().modulus()));
    if !(defect <= tol.residual_rel * scale.max(1.0)) {
        log::warn!("dense eigensolve residual {defect:.3e} at scale {scale:.3e}");
        return Err(SsvkError::NumericalBreakdown(format!(
            "eigendecomposition residual {defect:.3e} exceeds {:.1e} relative",
            tol.residual_rel
        )));
    }
    Ok(eig.eigenvalues.iter().copied().collect())
}

/// [`SpectrumExtractor::full`] with default tolerances.
pub fn spectrum_full(op: &SymmetricOperator) -> SsvkResult<Spectrum> {
    SpectrumExtractor::default().full(op)
}

/// [`SpectrumExtractor::lowest`] with default tolerances.
pub fn spectrum_lowest(op: &SymmetricOperator, k: usize) -> SsvkResult<Spectrum> {
    SpectrumExtractor::default().lowest(op, k)
}

/// [`SpectrumExtractor::bulk`] with default tolerances.
pub fn spectrum_bulk(op: &SymmetricOperator, lower: f64, upper: f64) -> SsvkResult<Vec<f64>> {
    SpectrumExtractor::default().bulk(op, lower, upper)
}
