// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Spectral (von Neumann) Entropy
// ─────────────────────────────────────────────────────────────────────
//! S = −Σ p_i ln p_i with p_i = |λ_i| / Σ_j |λ_j| over the Laplacian
//! spectrum. A graph without edges has S = 0.

use ssvk_graph::{FiniteCausalGraph, OperatorKind, SymmetricOperator};
use ssvk_spectral::SpectrumExtractor;
use ssvk_types::SsvkResult;

/// Entropy of the normalised absolute spectrum.
pub fn spectral_entropy(eigenvalues: &[f64]) -> f64 {
    let total: f64 = eigenvalues.iter().map(|v| v.abs()).sum();
    if !(total > 0.0) {
        return 0.0;
    }
    eigenvalues
        .iter()
        .map(|v| v.abs() / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Spectral entropy of the combinatorial Laplacian of `graph`.
pub fn graph_entropy(graph: &FiniteCausalGraph, extractor: &SpectrumExtractor) -> SsvkResult<f64> {
    let op = SymmetricOperator::from_graph(graph, &OperatorKind::Laplacian)?;
    let spectrum = extractor.full(&op)?;
    Ok(spectral_entropy(spectrum.values()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(n: usize) -> FiniteCausalGraph {
        let mut g = FiniteCausalGraph::new(n).unwrap();
        for i in 0..n {
            for j in (i + 1)..n {
                g.add_edge(i, j, 1.0).unwrap();
            }
        }
        g
    }

    #[test]
    fn test_uniform_spectrum_is_maximal() {
        let s = spectral_entropy(&[2.0; 8]);
        assert!((s - 8f64.ln()).abs() < 1e-12, "S = {s}");
        assert!(spectral_entropy(&[1.0, 2.0, 5.0]) < 3f64.ln());
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(spectral_entropy(&[]), 0.0);
        assert_eq!(spectral_entropy(&[0.0, 0.0]), 0.0);
        assert_eq!(spectral_entropy(&[0.0, 3.0]), 0.0);
    }

    #[test]
    fn test_complete_graph_entropy() {
        // K_n Laplacian: 0 once, n with multiplicity n − 1
        let n = 7;
        let s = graph_entropy(&complete(n), &SpectrumExtractor::default()).unwrap();
        assert!((s - ((n - 1) as f64).ln()).abs() < 1e-9, "S = {s}");
    }

    #[test]
    fn test_edgeless_graph_entropy() {
        let g = FiniteCausalGraph::new(5).unwrap();
        assert_eq!(graph_entropy(&g, &SpectrumExtractor::default()).unwrap(), 0.0);
    }
}
