// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Cyclic Jacobi Eigensolver
// ─────────────────────────────────────────────────────────────────────
//! Small dense symmetric eigenproblems, used for the Lanczos
//! tridiagonal (m ≲ 100). Row-major storage, eigenvectors in columns.

use ssvk_types::{SsvkError, SsvkResult};

const MAX_SWEEPS: usize = 60;

/// Off-diagonal mass below this fraction of ‖A‖_F counts as diagonal.
const REL_TOL: f64 = 1e-15;

/// Sorted eigenpairs of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    pub n: usize,
    /// Ascending.
    pub values: Vec<f64>,
    /// n×n row-major; column j is the eigenvector of `values[j]`.
    pub vectors: Vec<f64>,
}

impl EigenPairs {
    /// Component `row` of eigenvector `col`.
    #[inline]
    pub fn component(&self, row: usize, col: usize) -> f64 {
        self.vectors[row * self.n + col]
    }
}

/// Eigendecomposition of the symmetric tridiagonal matrix with diagonal
/// `alpha` and off-diagonal `beta` (`beta.len() == alpha.len() - 1`).
pub fn tridiagonal_eigen(alpha: &[f64], beta: &[f64]) -> SsvkResult<EigenPairs> {
    let m = alpha.len();
    if beta.len() + 1 != m.max(1) {
        return Err(SsvkError::InvalidParameters(format!(
            "tridiagonal shape mismatch: {} diagonal, {} off-diagonal",
            m,
            beta.len()
        )));
    }
    let mut a = vec![0.0; m * m];
    for i in 0..m {
        a[i * m + i] = alpha[i];
        if i + 1 < m {
            a[i * m + i + 1] = beta[i];
            a[(i + 1) * m + i] = beta[i];
        }
    }
    jacobi_eigen(a, m)
}

/// Cyclic Jacobi with the threshold strategy on early sweeps.
///
/// `a` is n×n row-major and symmetric. Fails with `NumericalBreakdown`
/// if the off-diagonal mass does not vanish within the sweep budget.
pub fn jacobi_eigen(mut a: Vec<f64>, n: usize) -> SsvkResult<EigenPairs> {
    if a.len() != n * n {
        return Err(SsvkError::InvalidParameters(format!(
            "jacobi input has {} entries, expected {}",
            a.len(),
            n * n
        )));
    }
    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let frob = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let tol = REL_TOL * frob.max(f64::MIN_POSITIVE);

    let mut converged = n < 2;
    for sweep in 0..MAX_SWEEPS {
        let off = off_diagonal_norm(&a, n);
        if off <= tol {
            converged = true;
            break;
        }
        let threshold = if sweep < 4 {
            0.2 * off / (n * n) as f64
        } else {
            0.0
        };

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq == 0.0 || apq.abs() < threshold {
                    continue;
                }
                rotate(&mut a, &mut v, n, p, q);
            }
        }
    }
    if !converged && off_diagonal_norm(&a, n) > tol {
        return Err(SsvkError::NumericalBreakdown(format!(
            "jacobi did not converge in {MAX_SWEEPS} sweeps (n={n})"
        )));
    }

    let values: Vec<f64> = (0..n).map(|i| a[i * n + i]).collect();
    Ok(sort_eigenpairs(values, v, n))
}

fn off_diagonal_norm(a: &[f64], n: usize) -> f64 {
    let mut s = 0.0;
    for p in 0..n {
        for q in (p + 1)..n {
            s += a[p * n + q] * a[p * n + q];
        }
    }
    (2.0 * s).sqrt()
}

/// Annihilate a[p][q] with one Rutishauser-form rotation.
fn rotate(a: &mut [f64], v: &mut [f64], n: usize, p: usize, q: usize) {
    let apq = a[p * n + q];
    let diff = a[q * n + q] - a[p * n + p];
    let t = if diff.abs() < 1e-300 {
        apq.signum()
    } else {
        let theta = diff / (2.0 * apq);
        theta.signum() / (theta.abs() + (1.0 + theta * theta).sqrt())
    };
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = t * c;
    let tau = s / (1.0 + c);

    a[p * n + p] -= t * apq;
    a[q * n + q] += t * apq;
    a[p * n + q] = 0.0;
    a[q * n + p] = 0.0;

    for r in 0..n {
        if r == p || r == q {
            continue;
        }
        let arp = a[r * n + p];
        let arq = a[r * n + q];
        a[r * n + p] = arp - s * (arq + tau * arp);
        a[p * n + r] = a[r * n + p];
        a[r * n + q] = arq + s * (arp - tau * arq);
        a[q * n + r] = a[r * n + q];
    }
    for r in 0..n {
        let vrp = v[r * n + p];
        let vrq = v[r * n + q];
        v[r * n + p] = vrp - s * (vrq + tau * vrp);
        v[r * n + q] = vrq + s * (vrp - tau * vrq);
    }
}

/// Sort ascending, permuting eigenvector columns alongside.
fn sort_eigenpairs(values: Vec<f64>, vectors: Vec<f64>, n: usize) -> EigenPairs {
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut sorted_vecs = vec![0.0; n * n];
    for (new_col, &old_col) in order.iter().enumerate() {
        for row in 0..n {
            sorted_vecs[row * n + new_col] = vectors[row * n + old_col];
        }
    }
    EigenPairs {
        n,
        values: order.iter().map(|&i| values[i]).collect(),
        vectors: sorted_vecs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_input() {
        let n = 4;
        let mut a = vec![0.0; n * n];
        for (i, d) in [3.0, 1.0, 4.0, 2.0].into_iter().enumerate() {
            a[i * n + i] = d;
        }
        let e = jacobi_eigen(a, n).unwrap();
        assert_eq!(e.values, vec![1.0, 2.0, 3.0, 4.0]);
        // column 0 belongs to the old index 1
        assert_eq!(e.component(1, 0), 1.0);
    }

    #[test]
    fn test_eigenvectors_orthonormal() {
        let n = 4;
        let a = vec![
            4.0, 1.0, 0.5, 0.2, 1.0, 3.0, 0.8, 0.3, 0.5, 0.8, 2.0, 0.1, 0.2, 0.3, 0.1, 1.0,
        ];
        let e = jacobi_eigen(a.clone(), n).unwrap();
        for i in 0..n {
            for j in 0..n {
                let dot: f64 = (0..n).map(|k| e.component(k, i) * e.component(k, j)).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-12, "V^T V[{i},{j}] = {dot}");
            }
        }
        // A v = λ v
        for j in 0..n {
            for r in 0..n {
                let av: f64 = (0..n).map(|k| a[r * n + k] * e.component(k, j)).sum();
                assert!((av - e.values[j] * e.component(r, j)).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_tridiagonal_path_spectrum() {
        // path Laplacian interior block: 2 on the diagonal, -1 off
        let m = 6;
        let e = tridiagonal_eigen(&vec![2.0; m], &vec![-1.0; m - 1]).unwrap();
        for (k, &val) in e.values.iter().enumerate() {
            let exact =
                2.0 - 2.0 * (std::f64::consts::PI * (k + 1) as f64 / (m + 1) as f64).cos();
            assert!((val - exact).abs() < 1e-12, "λ_{k} = {val}, expected {exact}");
        }
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(tridiagonal_eigen(&[1.0, 2.0], &[]).is_err());
        assert!(jacobi_eigen(vec![1.0; 5], 2).is_err());
    }
}
