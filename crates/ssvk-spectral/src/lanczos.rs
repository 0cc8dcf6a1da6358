// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Lanczos Lowest-k Solver
// ─────────────────────────────────────────────────────────────────────
//! Krylov tridiagonalisation with full reorthogonalisation. Ritz values
//! come from a Jacobi solve of T_m; each carries the residual bound
//! |β_m · s_{m,i}| from the last row of T_m's eigenvector matrix.
//!
//! A single start vector sees one copy of each eigenvalue. Degenerate
//! eigenvalues are recovered by deflation: later runs are kept
//! orthogonal to the Ritz vectors already locked, and expose the next
//! copy.

use rand::Rng;

use ssvk_graph::{seeded_rng, SymmetricOperator};
use ssvk_types::{Checkpoint, SsvkError, SsvkResult};

use crate::jacobi::tridiagonal_eigen;

/// Relative norm below which the Krylov space is declared invariant.
const INVARIANT_TOL: f64 = 1e-12;

/// Lowest Ritz pairs of a Lanczos run.
#[derive(Debug, Clone)]
pub struct LanczosOutcome {
    /// Ascending Ritz values.
    pub values: Vec<f64>,
    /// Residual bound per Ritz value.
    pub residuals: Vec<f64>,
    /// Krylov dimension actually reached.
    pub iterations: usize,
    /// Whether an invariant subspace was found (exact Ritz values).
    pub invariant: bool,
    /// Unit Ritz vector per Ritz value.
    pub vectors: Vec<Vec<f64>>,
}

impl LanczosOutcome {
    pub fn max_residual(&self) -> f64 {
        self.residuals.iter().fold(0.0_f64, |m, r| m.max(*r))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn project_out(w: &mut [f64], against: &[Vec<f64>]) {
    for q in against {
        let proj = dot(w, q);
        for (wi, qi) in w.iter_mut().zip(q) {
            *wi -= proj * qi;
        }
    }
}

/// Run up to `krylov_dim` Lanczos steps on a real symmetric operator and
/// return the `k` lowest Ritz values with their residual bounds.
///
/// `checkpoint` is probed once per Krylov step.
pub fn lanczos_lowest<C: Checkpoint + ?Sized>(
    op: &SymmetricOperator,
    k: usize,
    krylov_dim: usize,
    seed: u64,
    checkpoint: &C,
) -> SsvkResult<LanczosOutcome> {
    lanczos_deflated(op, k, krylov_dim, seed, &[], checkpoint)
}

/// As [`lanczos_lowest`], restricted to the orthogonal complement of
/// `locked`. The locked vectors must be orthonormal eigenvectors of `op`.
pub fn lanczos_deflated<C: Checkpoint + ?Sized>(
    op: &SymmetricOperator,
    k: usize,
    krylov_dim: usize,
    seed: u64,
    locked: &[Vec<f64>],
    checkpoint: &C,
) -> SsvkResult<LanczosOutcome> {
    let n = op.dim();
    if op.is_complex() {
        return Err(SsvkError::InvalidParameters(
            "lanczos runs on real symmetric operators only".to_string(),
        ));
    }
    if k == 0 || k > n {
        return Err(SsvkError::InvalidParameters(format!(
            "requested {k} eigenvalues of a {n}x{n} operator"
        )));
    }
    if locked.iter().any(|q| q.len() != n) {
        let msg = format!("locked vectors must have length {n}");
        return Err(SsvkError::InvalidParameters(msg));
    }
    let free = n.saturating_sub(locked.len());
    if free == 0 {
        return Ok(LanczosOutcome {
            values: Vec::new(),
            residuals: Vec::new(),
            iterations: 0,
            invariant: true,
            vectors: Vec::new(),
        });
    }
    let m_max = krylov_dim.clamp(k.min(free), free);

    let mut rng = seeded_rng(seed);
    let mut v: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() - 0.5).collect();
    project_out(&mut v, locked);
    project_out(&mut v, locked);
    let norm = dot(&v, &v).sqrt();
    if !(norm > INVARIANT_TOL) {
        return Err(SsvkError::NumericalBreakdown(
            "lanczos start vector vanished".to_string(),
        ));
    }
    v.iter_mut().for_each(|x| *x /= norm);

    let mut alpha = Vec::with_capacity(m_max);
    let mut beta = Vec::with_capacity(m_max);
    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(m_max + 1);
    basis.push(v.clone());

    let mut w = vec![0.0; n];
    let mut v_prev = vec![0.0; n];
    let mut beta_prev = 0.0;
    let mut invariant = false;
    let mut op_scale = 0.0_f64;

    for j in 0..m_max {
        checkpoint.check()?;
        op.matvec(&v, &mut w)?;
        if j > 0 {
            for (wi, pi) in w.iter_mut().zip(&v_prev) {
                *wi -= beta_prev * pi;
            }
        }
        let a_j = dot(&w, &v);
        alpha.push(a_j);
        for (wi, vi) in w.iter_mut().zip(&v) {
            *wi -= a_j * vi;
        }
        project_out(&mut w, locked);
        project_out(&mut w, &basis);

        let b_next = dot(&w, &w).sqrt();
        op_scale = op_scale.max(a_j.abs()).max(b_next);
        if !b_next.is_finite() {
            return Err(SsvkError::NumericalBreakdown(format!(
                "lanczos produced a non-finite norm at step {j}"
            )));
        }
        if b_next <= INVARIANT_TOL * op_scale.max(1.0) {
            beta.push(0.0);
            invariant = true;
            break;
        }
        beta.push(b_next);
        if j + 1 == m_max {
            break;
        }

        v_prev.copy_from_slice(&v);
        beta_prev = b_next;
        for (vi, wi) in v.iter_mut().zip(&w) {
            *vi = wi / b_next;
        }
        basis.push(v.clone());
    }

    let m = alpha.len();
    let beta_m = beta.last().copied().unwrap_or(0.0);
    let tri = tridiagonal_eigen(&alpha, &beta[..m - 1])?;

    let take = k.min(m);
    let values = tri.values[..take].to_vec();
    let residuals = (0..take)
        .map(|i| (beta_m * tri.component(m - 1, i)).abs())
        .collect();
    let vectors = (0..take)
        .map(|i| {
            let mut y = vec![0.0; n];
            for (j, q) in basis.iter().take(m).enumerate() {
                let s_ji = tri.component(j, i);
                for (yi, qi) in y.iter_mut().zip(q) {
                    *yi += s_ji * qi;
                }
            }
            let norm = dot(&y, &y).sqrt();
            if norm > 0.0 {
                y.iter_mut().for_each(|x| *x /= norm);
            }
            y
        })
        .collect();

    Ok(LanczosOutcome {
        values,
        residuals,
        iterations: m,
        invariant,
        vectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssvk_graph::{build_grid, FiniteCausalGraph, OperatorKind};
    use ssvk_types::Unbounded;

    fn path_laplacian(n: usize) -> SymmetricOperator {
        let g = build_grid(n, 1, false).unwrap();
        SymmetricOperator::from_graph(&g, &OperatorKind::Laplacian).unwrap()
    }

    #[test]
    fn test_lowest_of_path_laplacian() {
        let n = 60;
        let op = path_laplacian(n);
        let out = lanczos_lowest(&op, 3, n, 1, &Unbounded).unwrap();
        for (k, &val) in out.values.iter().enumerate() {
            // open path: λ_k = 2 - 2cos(kπ/n)
            let exact = 2.0 - 2.0 * (std::f64::consts::PI * k as f64 / n as f64).cos();
            assert!((val - exact).abs() < 1e-9, "λ_{k} = {val}, expected {exact}");
        }
        assert!(out.max_residual() < 1e-8, "residual {}", out.max_residual());
    }

    #[test]
    fn test_full_krylov_is_invariant() {
        let op = path_laplacian(10);
        let out = lanczos_lowest(&op, 2, 10, 3, &Unbounded).unwrap();
        assert!(out.iterations <= 10);
        assert!(out.values[0].abs() < 1e-10);
    }

    #[test]
    fn test_deflation_exposes_second_copy() {
        // two disjoint paths share every eigenvalue
        let mut g = FiniteCausalGraph::new(40).unwrap();
        for base in [0, 20] {
            for i in base..base + 19 {
                g.add_edge(i, i + 1, 1.0).unwrap();
            }
        }
        let op = SymmetricOperator::from_graph(&g, &OperatorKind::Laplacian).unwrap();

        let first = lanczos_lowest(&op, 1, 40, 1, &Unbounded).unwrap();
        assert!(first.values[0].abs() < 1e-9);
        let second = lanczos_deflated(&op, 1, 40, 2, &first.vectors, &Unbounded).unwrap();
        assert!(
            second.values[0].abs() < 1e-9,
            "deflated run missed the second zero mode: {:?}",
            second.values
        );
        assert!(dot(&first.vectors[0], &second.vectors[0]).abs() < 1e-8);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let op = path_laplacian(5);
        assert!(lanczos_lowest(&op, 0, 5, 1, &Unbounded).is_err());
        assert!(lanczos_lowest(&op, 6, 5, 1, &Unbounded).is_err());
    }

    #[test]
    fn test_checkpoint_trips() {
        struct Tripped;
        impl Checkpoint for Tripped {
            fn check(&self) -> SsvkResult<()> {
                Err(SsvkError::Cancelled)
            }
        }
        let op = path_laplacian(8);
        assert!(matches!(
            lanczos_lowest(&op, 1, 8, 1, &Tripped),
            Err(SsvkError::Cancelled)
        ));
    }
}
