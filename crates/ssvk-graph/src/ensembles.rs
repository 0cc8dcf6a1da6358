// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Gaussian Random-Matrix Ensembles
// ─────────────────────────────────────────────────────────────────────
//! GUE: independent standard complex normals above the diagonal
//! (E|z|² = 1), real standard normals on the diagonal, mirrored as the
//! conjugate below. Exactly Hermitian by construction.
//!
//! GOE: (A + Aᵀ)/2 with A filled by standard normals, so the diagonal
//! has unit variance and off-diagonal entries variance 1/2.

use nalgebra::DMatrix;
use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;

use ssvk_types::{SsvkError, SsvkResult};

fn check_size(n: usize) -> SsvkResult<()> {
    if n == 0 {
        return Err(SsvkError::InvalidParameters(
            "ensemble matrix needs n >= 1".to_string(),
        ));
    }
    Ok(())
}

/// n×n Gaussian Unitary Ensemble sample.
pub fn build_gue<R: Rng + ?Sized>(n: usize, rng: &mut R) -> SsvkResult<DMatrix<Complex64>> {
    check_size(n)?;
    let mut h = DMatrix::<Complex64>::zeros(n, n);
    let scale = std::f64::consts::FRAC_1_SQRT_2;
    for i in 0..n {
        let d: f64 = rng.sample(StandardNormal);
        h[(i, i)] = Complex64::new(d, 0.0);
        for j in (i + 1)..n {
            let re: f64 = rng.sample(StandardNormal);
            let im: f64 = rng.sample(StandardNormal);
            let z = Complex64::new(re * scale, im * scale);
            h[(i, j)] = z;
            h[(j, i)] = z.conj();
        }
    }
    Ok(h)
}

/// n×n Gaussian Orthogonal Ensemble sample.
pub fn build_goe<R: Rng + ?Sized>(n: usize, rng: &mut R) -> SsvkResult<DMatrix<f64>> {
    check_size(n)?;
    let mut h = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        h[(i, i)] = rng.sample(StandardNormal);
        for j in (i + 1)..n {
            let a: f64 = rng.sample(StandardNormal);
            let b: f64 = rng.sample(StandardNormal);
            let v = 0.5 * (a + b);
            h[(i, j)] = v;
            h[(j, i)] = v;
        }
    }
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seeded_rng;

    #[test]
    fn test_gue_exactly_hermitian() {
        let h = build_gue(40, &mut seeded_rng(42)).unwrap();
        for i in 0..40 {
            assert_eq!(h[(i, i)].im, 0.0);
            for j in 0..40 {
                assert_eq!(h[(i, j)], h[(j, i)].conj(), "H[{i},{j}]");
            }
        }
    }

    #[test]
    fn test_gue_offdiag_variance() {
        let n = 200;
        let h = build_gue(n, &mut seeded_rng(5)).unwrap();
        let mut acc = 0.0;
        let mut count = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                acc += h[(i, j)].norm_sqr();
                count += 1.0;
            }
        }
        let var = acc / count;
        assert!((var - 1.0).abs() < 0.05, "E|z|^2 = {var}");
    }

    #[test]
    fn test_goe_symmetric() {
        let h = build_goe(25, &mut seeded_rng(1)).unwrap();
        assert_eq!(h, h.transpose());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(build_gue(0, &mut seeded_rng(1)).is_err());
        assert!(build_goe(0, &mut seeded_rng(1)).is_err());
    }
}
