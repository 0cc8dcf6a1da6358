// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Symmetric Operator Capability
// ─────────────────────────────────────────────────────────────────────
//! A closed set of operator representations sharing one capability:
//! shape, dense view, and y = A·x for the real variants.

use std::borrow::Cow;

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use ssvk_types::{SsvkError, SsvkResult};

use crate::csr::CsrMatrix;
use crate::graph::FiniteCausalGraph;

/// Real symmetric or complex Hermitian operator.
#[derive(Debug, Clone, PartialEq)]
pub enum SymmetricOperator {
    Dense(DMatrix<f64>),
    Hermitian(DMatrix<Complex64>),
    SparseCsr(CsrMatrix),
    GraphLaplacian(CsrMatrix),
    GraphHamiltonian(CsrMatrix),
}

/// Borrowed or materialised dense form of an operator.
#[derive(Debug, Clone)]
pub enum DenseView<'a> {
    Real(Cow<'a, DMatrix<f64>>),
    Complex(&'a DMatrix<Complex64>),
}

/// Which operator to derive from a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Adjacency,
    Laplacian,
    NormalizedLaplacian,
    /// Laplacian plus the entropic potential of each node's saturation.
    Hamiltonian { saturation: Vec<f64> },
    /// Laplacian plus diag(h) from the graph's bias vector.
    BiasedLaplacian,
}

impl OperatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Adjacency => "adjacency",
            Self::Laplacian => "laplacian",
            Self::NormalizedLaplacian => "normalized_laplacian",
            Self::Hamiltonian { .. } => "hamiltonian",
            Self::BiasedLaplacian => "biased_laplacian",
        }
    }
}

impl SymmetricOperator {
    /// Derive an operator from `graph`.
    pub fn from_graph(graph: &FiniteCausalGraph, kind: &OperatorKind) -> SsvkResult<Self> {
        Ok(match kind {
            OperatorKind::Adjacency => Self::SparseCsr(graph.to_adjacency()),
            OperatorKind::Laplacian => Self::GraphLaplacian(graph.to_laplacian()),
            OperatorKind::NormalizedLaplacian => {
                Self::GraphLaplacian(graph.to_normalized_laplacian())
            }
            OperatorKind::Hamiltonian { saturation } => {
                Self::GraphHamiltonian(graph.to_hamiltonian(saturation)?)
            }
            OperatorKind::BiasedLaplacian => Self::GraphHamiltonian(graph.to_biased_laplacian()),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::Dense(m) => m.shape(),
            Self::Hermitian(m) => m.shape(),
            Self::SparseCsr(c) | Self::GraphLaplacian(c) | Self::GraphHamiltonian(c) => (c.n, c.n),
        }
    }

    /// Side length of a square operator.
    pub fn dim(&self) -> usize {
        self.shape().0
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Hermitian(_))
    }

    /// CSR storage when the operator is sparse.
    pub fn as_csr(&self) -> Option<&CsrMatrix> {
        match self {
            Self::SparseCsr(c) | Self::GraphLaplacian(c) | Self::GraphHamiltonian(c) => Some(c),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Dense(_) => "dense",
            Self::Hermitian(_) => "hermitian",
            Self::SparseCsr(_) => "sparse",
            Self::GraphLaplacian(_) => "graph_laplacian",
            Self::GraphHamiltonian(_) => "graph_hamiltonian",
        }
    }

    /// Dense view. Sparse variants are materialised.
    pub fn dense_view(&self) -> DenseView<'_> {
        match self {
            Self::Dense(m) => DenseView::Real(Cow::Borrowed(m)),
            Self::Hermitian(m) => DenseView::Complex(m),
            Self::SparseCsr(c) | Self::GraphLaplacian(c) | Self::GraphHamiltonian(c) => {
                DenseView::Real(Cow::Owned(c.to_dense()))
            }
        }
    }

    /// y = A·x for real operators.
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) -> SsvkResult<()> {
        let n = self.dim();
        if x.len() != n || y.len() != n {
            return Err(SsvkError::InvalidParameters(format!(
                "matvec length mismatch: operator {n}, x {}, y {}",
                x.len(),
                y.len()
            )));
        }
        match self {
            Self::Dense(m) => {
                for (i, yi) in y.iter_mut().enumerate() {
                    *yi = m.row(i).iter().zip(x).map(|(a, b)| a * b).sum();
                }
                Ok(())
            }
            Self::Hermitian(_) => Err(SsvkError::InvalidParameters(
                "real matvec on a complex Hermitian operator".to_string(),
            )),
            Self::SparseCsr(c) | Self::GraphLaplacian(c) | Self::GraphHamiltonian(c) => {
                c.spmv(x, y);
                Ok(())
            }
        }
    }

    /// Reject non-square, non-finite, or asymmetric operators.
    ///
    /// Tolerance is relative to the largest entry magnitude.
    pub fn check_hermitian(&self, rel_tol: f64) -> SsvkResult<()> {
        let (r, c) = self.shape();
        if r != c {
            return Err(SsvkError::InvalidParameters(format!(
                "operator is not square: {r}x{c}"
            )));
        }
        if r == 0 {
            return Err(SsvkError::InvalidParameters("operator is empty".to_string()));
        }
        let (scale, defect, finite) = match self {
            Self::Dense(m) => {
                let scale = m.amax();
                let defect = (m - m.transpose()).amax();
                (scale, defect, m.iter().all(|v| v.is_finite()))
            }
            Self::Hermitian(m) => {
                let scale = m.iter().fold(0.0_f64, |a, z| a.max(z.norm()));
                let defect = (m - m.adjoint())
                    .iter()
                    .fold(0.0_f64, |a, z| a.max(z.norm()));
                let finite = m.iter().all(|z| z.re.is_finite() && z.im.is_finite());
                (scale, defect, finite)
            }
            Self::SparseCsr(c) | Self::GraphLaplacian(c) | Self::GraphHamiltonian(c) => {
                (c.max_abs(), c.asymmetry(), c.values.iter().all(|v| v.is_finite()))
            }
        };
        if !finite {
            return Err(SsvkError::InvalidParameters(
                "operator has non-finite entries".to_string(),
            ));
        }
        if defect > rel_tol * scale.max(1.0) {
            return Err(SsvkError::InvalidParameters(format!(
                "operator is not Hermitian: defect {defect:.3e} at scale {scale:.3e}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::build_grid;
    use crate::ensembles::build_gue;
    use crate::seed::seeded_rng;

    #[test]
    fn test_from_graph_variants() {
        let g = build_grid(4, 1, true).unwrap();
        let lap = SymmetricOperator::from_graph(&g, &OperatorKind::Laplacian).unwrap();
        assert_eq!(lap.kind_name(), "graph_laplacian");
        assert_eq!(lap.shape(), (4, 4));
        let adj = SymmetricOperator::from_graph(&g, &OperatorKind::Adjacency).unwrap();
        assert_eq!(adj.as_csr().map(|c| c.nnz()), Some(8));
        let bad = OperatorKind::Hamiltonian {
            saturation: vec![0.1; 3],
        };
        assert!(SymmetricOperator::from_graph(&g, &bad).is_err());
    }

    #[test]
    fn test_matvec_dense_matches_sparse() {
        let g = build_grid(3, 2, false).unwrap();
        let sparse = SymmetricOperator::from_graph(&g, &OperatorKind::Laplacian).unwrap();
        let dense = match sparse.dense_view() {
            DenseView::Real(m) => SymmetricOperator::Dense(m.into_owned()),
            DenseView::Complex(_) => panic!("laplacian is real"),
        };
        let x: Vec<f64> = (0..9).map(|i| i as f64 * 0.5 - 1.0).collect();
        let (mut ys, mut yd) = (vec![0.0; 9], vec![0.0; 9]);
        sparse.matvec(&x, &mut ys).unwrap();
        dense.matvec(&x, &mut yd).unwrap();
        for (a, b) in ys.iter().zip(&yd) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!(sparse.matvec(&x[..3], &mut ys).is_err());
    }

    #[test]
    fn test_hermitian_check() {
        let h = build_gue(12, &mut seeded_rng(4)).unwrap();
        let op = SymmetricOperator::Hermitian(h.clone());
        assert!(op.check_hermitian(1e-10).is_ok());
        assert!(op.is_complex());
        assert!(op.matvec(&[0.0; 12], &mut [0.0; 12]).is_err());

        let mut broken = h;
        broken[(0, 1)] += Complex64::new(0.5, 0.0);
        assert!(matches!(
            SymmetricOperator::Hermitian(broken).check_hermitian(1e-10),
            Err(SsvkError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_non_square_and_nan_rejected() {
        let rect = SymmetricOperator::Dense(DMatrix::zeros(2, 3));
        assert!(rect.check_hermitian(1e-10).is_err());
        let mut m = DMatrix::<f64>::identity(3, 3);
        m[(1, 1)] = f64::NAN;
        assert!(SymmetricOperator::Dense(m).check_hermitian(1e-10).is_err());
    }
}
