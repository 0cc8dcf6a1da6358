// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Finite Causal Graph
// ─────────────────────────────────────────────────────────────────────
//! Undirected weighted graph stored as an arena of nodes, each owning a
//! sorted neighbour map. Weights may be negative (frustrated coupling)
//! but never NaN or ±∞. Self-loops are forbidden; on-site terms live in
//! the separate bias vector.

use std::collections::{BTreeMap, VecDeque};

use ssvk_types::{SsvkError, SsvkResult};

use crate::csr::CsrMatrix;

/// Dense node index in [0, N).
pub type NodeId = usize;

/// Finite undirected graph with symmetric adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteCausalGraph {
    adjacency: Vec<BTreeMap<NodeId, f64>>,
    bias: Option<Vec<f64>>,
    edges: usize,
}

/// Saved neighbour sets. Restoring swaps the arena back in one step.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    adjacency: Vec<BTreeMap<NodeId, f64>>,
    edges: usize,
}

impl FiniteCausalGraph {
    /// Graph with `n` isolated nodes.
    pub fn new(n: usize) -> SsvkResult<Self> {
        if n == 0 {
            return Err(SsvkError::InvalidParameters(
                "graph must have at least one node".to_string(),
            ));
        }
        Ok(Self {
            adjacency: vec![BTreeMap::new(); n],
            bias: None,
            edges: 0,
        })
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges
    }

    fn check_node(&self, i: NodeId) -> SsvkResult<()> {
        if i >= self.adjacency.len() {
            return Err(SsvkError::InvalidParameters(format!(
                "node {i} out of range [0, {})",
                self.adjacency.len()
            )));
        }
        Ok(())
    }

    /// Insert or overwrite the undirected edge {i, j}.
    pub fn add_edge(&mut self, i: NodeId, j: NodeId, weight: f64) -> SsvkResult<()> {
        self.check_node(i)?;
        self.check_node(j)?;
        if i == j {
            return Err(SsvkError::InvalidParameters(format!(
                "self-loop on node {i}; use the bias vector for on-site terms"
            )));
        }
        if !weight.is_finite() {
            return Err(SsvkError::InvalidParameters(format!(
                "non-finite weight {weight} on edge ({i}, {j})"
            )));
        }
        if self.adjacency[i].insert(j, weight).is_none() {
            self.edges += 1;
        }
        self.adjacency[j].insert(i, weight);
        Ok(())
    }

    /// Remove {i, j}, returning its weight if it was present.
    pub fn remove_edge(&mut self, i: NodeId, j: NodeId) -> Option<f64> {
        if i >= self.node_count() || j >= self.node_count() {
            return None;
        }
        let w = self.adjacency[i].remove(&j)?;
        self.adjacency[j].remove(&i);
        self.edges -= 1;
        Some(w)
    }

    /// Flip the presence of {i, j}. New edges get unit weight.
    ///
    /// Returns whether the edge is present afterwards.
    pub fn toggle_edge(&mut self, i: NodeId, j: NodeId) -> SsvkResult<bool> {
        if self.remove_edge(i, j).is_some() {
            Ok(false)
        } else {
            self.add_edge(i, j, 1.0)?;
            Ok(true)
        }
    }

    pub fn has_edge(&self, i: NodeId, j: NodeId) -> bool {
        self.weight(i, j).is_some()
    }

    pub fn weight(&self, i: NodeId, j: NodeId) -> Option<f64> {
        self.adjacency.get(i)?.get(&j).copied()
    }

    /// Neighbours of `i` in ascending order with their weights.
    pub fn neighbours(&self, i: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.adjacency[i].iter().map(|(&j, &w)| (j, w))
    }

    pub fn degree(&self, i: NodeId) -> usize {
        self.adjacency[i].len()
    }

    /// Σ_j w_ij.
    pub fn weighted_degree(&self, i: NodeId) -> f64 {
        self.adjacency[i].values().sum()
    }

    /// Each undirected edge once, as (i, j, w) with i < j.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(i, row)| {
            row.range(i + 1..).map(move |(&j, &w)| (i, j, w))
        })
    }

    /// Attach an on-site bias vector (one finite entry per node).
    pub fn set_bias(&mut self, bias: Vec<f64>) -> SsvkResult<()> {
        if bias.len() != self.node_count() {
            return Err(SsvkError::InvalidParameters(format!(
                "bias length {} != node count {}",
                bias.len(),
                self.node_count()
            )));
        }
        if let Some(i) = bias.iter().position(|b| !b.is_finite()) {
            return Err(SsvkError::InvalidParameters(format!(
                "non-finite bias on node {i}"
            )));
        }
        self.bias = Some(bias);
        Ok(())
    }

    pub fn bias(&self) -> Option<&[f64]> {
        self.bias.as_deref()
    }

    /// Sizes of the connected components, largest first.
    pub fn component_sizes(&self) -> Vec<usize> {
        let n = self.node_count();
        let mut seen = vec![false; n];
        let mut sizes = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            queue.push_back(start);
            let mut size = 0;
            while let Some(u) = queue.pop_front() {
                size += 1;
                for &v in self.adjacency[u].keys() {
                    if !seen[v] {
                        seen[v] = true;
                        queue.push_back(v);
                    }
                }
            }
            sizes.push(size);
        }
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    pub fn connected_components(&self) -> usize {
        self.component_sizes().len()
    }

    /// O(E) copy of the neighbour sets.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            adjacency: self.adjacency.clone(),
            edges: self.edges,
        }
    }

    /// Replace the current neighbour sets with a snapshot.
    pub fn restore(&mut self, snapshot: GraphSnapshot) {
        debug_assert_eq!(snapshot.adjacency.len(), self.adjacency.len());
        self.adjacency = snapshot.adjacency;
        self.edges = snapshot.edges;
    }

    /// Check the symmetric / loop-free / finite invariants.
    pub fn validate(&self) -> SsvkResult<()> {
        for (i, row) in self.adjacency.iter().enumerate() {
            for (&j, &w) in row {
                if i == j || !w.is_finite() || self.weight(j, i) != Some(w) {
                    return Err(SsvkError::InvalidParameters(format!(
                        "graph invariant broken at edge ({i}, {j}) weight {w}"
                    )));
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operator assembly
    // ------------------------------------------------------------------

    /// Assemble a CSR matrix with the graph's sparsity plus a diagonal.
    fn assemble<D, O>(&self, diag: D, off: O) -> CsrMatrix
    where
        D: Fn(NodeId) -> f64,
        O: Fn(NodeId, NodeId, f64) -> f64,
    {
        let n = self.node_count();
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::with_capacity(2 * self.edges + n);
        let mut values = Vec::with_capacity(2 * self.edges + n);
        row_ptr.push(0);
        for i in 0..n {
            let d = diag(i);
            let mut placed = d == 0.0;
            for (&j, &w) in &self.adjacency[i] {
                if !placed && j > i {
                    col_idx.push(i);
                    values.push(d);
                    placed = true;
                }
                col_idx.push(j);
                values.push(off(i, j, w));
            }
            if !placed {
                col_idx.push(i);
                values.push(d);
            }
            row_ptr.push(col_idx.len());
        }
        CsrMatrix {
            n,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Weighted adjacency matrix A.
    pub fn to_adjacency(&self) -> CsrMatrix {
        self.assemble(|_| 0.0, |_, _, w| w)
    }

    /// Combinatorial Laplacian L = D − A.
    pub fn to_laplacian(&self) -> CsrMatrix {
        self.assemble(|i| self.weighted_degree(i), |_, _, w| -w)
    }

    /// Normalised Laplacian L_sym = I − D^{-1/2} A D^{-1/2}.
    ///
    /// Isolated nodes (degree ≈ 0) get zero rows/cols.
    pub fn to_normalized_laplacian(&self) -> CsrMatrix {
        let d_inv_sqrt: Vec<f64> = (0..self.node_count())
            .map(|i| {
                let d = self.weighted_degree(i);
                if d > 1e-12 {
                    1.0 / d.sqrt()
                } else {
                    0.0
                }
            })
            .collect();
        self.assemble(
            |i| if d_inv_sqrt[i] == 0.0 { 0.0 } else { 1.0 },
            |i, j, w| -(d_inv_sqrt[i] * w * d_inv_sqrt[j]),
        )
    }

    /// Laplacian plus the entropic potential V_i = −ln(1 − min(s_i, 1 − 10⁻⁴)).
    ///
    /// `saturation` holds one node state s_i ≥ 0 per node.
    pub fn to_hamiltonian(&self, saturation: &[f64]) -> SsvkResult<CsrMatrix> {
        if saturation.len() != self.node_count() {
            return Err(SsvkError::InvalidParameters(format!(
                "saturation length {} != node count {}",
                saturation.len(),
                self.node_count()
            )));
        }
        if let Some(i) = saturation.iter().position(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(SsvkError::InvalidParameters(format!(
                "saturation on node {i} must be finite and >= 0, got {}",
                saturation[i]
            )));
        }
        Ok(self.assemble(
            |i| self.weighted_degree(i) + entropic_potential(saturation[i]),
            |_, _, w| -w,
        ))
    }

    /// Laplacian plus diag(h) from the stored bias (zero when absent).
    pub fn to_biased_laplacian(&self) -> CsrMatrix {
        let bias = self.bias.as_deref();
        self.assemble(
            |i| self.weighted_degree(i) + bias.map_or(0.0, |b| b[i]),
            |_, _, w| -w,
        )
    }
}

/// On-site entropic potential of a node with saturation `s`.
#[inline]
pub fn entropic_potential(s: f64) -> f64 {
    -(1.0 - s.min(1.0 - 1e-4)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(n: usize) -> FiniteCausalGraph {
        let mut g = FiniteCausalGraph::new(n).unwrap();
        for i in 0..n - 1 {
            g.add_edge(i, i + 1, 1.0).unwrap();
        }
        g
    }

    #[test]
    fn test_empty_graph_rejected() {
        assert!(matches!(
            FiniteCausalGraph::new(0),
            Err(SsvkError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_self_loop_and_nan_rejected() {
        let mut g = FiniteCausalGraph::new(3).unwrap();
        assert!(g.add_edge(1, 1, 1.0).is_err());
        assert!(g.add_edge(0, 1, f64::NAN).is_err());
        assert!(g.add_edge(0, 1, f64::INFINITY).is_err());
        assert!(g.add_edge(0, 7, 1.0).is_err());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_symmetric_insert_and_overwrite() {
        let mut g = FiniteCausalGraph::new(3).unwrap();
        g.add_edge(0, 2, -1.5).unwrap();
        g.add_edge(2, 0, 0.5).unwrap();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight(0, 2), Some(0.5));
        assert_eq!(g.weight(2, 0), Some(0.5));
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_toggle_edge() {
        let mut g = FiniteCausalGraph::new(4).unwrap();
        assert!(g.toggle_edge(1, 3).unwrap());
        assert!(g.has_edge(3, 1));
        assert!(!g.toggle_edge(3, 1).unwrap());
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_components() {
        let mut g = path(5);
        assert_eq!(g.connected_components(), 1);
        g.remove_edge(1, 2);
        assert_eq!(g.component_sizes(), vec![3, 2]);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut g = path(4);
        let snap = g.snapshot();
        g.toggle_edge(0, 3).unwrap();
        g.remove_edge(0, 1);
        g.restore(snap);
        assert_eq!(g, path(4));
    }

    #[test]
    fn test_laplacian_rows_sum_to_zero() {
        let mut g = path(4);
        g.add_edge(0, 3, 2.0).unwrap();
        let l = g.to_laplacian();
        let mut y = vec![0.0; 4];
        l.spmv(&[1.0; 4], &mut y);
        assert!(y.iter().all(|v| v.abs() < 1e-12), "row sums {y:?}");
        assert_eq!(l.get(0, 0), 3.0);
        assert_eq!(l.get(0, 3), -2.0);
        assert_eq!(l.asymmetry(), 0.0);
    }

    #[test]
    fn test_edges_listed_once() {
        let g = path(4);
        let e: Vec<_> = g.edges().collect();
        assert_eq!(e, vec![(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]);
    }

    #[test]
    fn test_hamiltonian_potential() {
        let g = path(3);
        let h = g.to_hamiltonian(&[0.0, 0.5, 1.0]).unwrap();
        assert!((h.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((h.get(1, 1) - (2.0 + 2.0_f64.ln())).abs() < 1e-12);
        // s = 1 clamps to 1 - 1e-4
        assert!((h.get(2, 2) - (1.0 + 1e4_f64.ln())).abs() < 1e-9);
        assert!(g.to_hamiltonian(&[0.0, -0.1, 0.0]).is_err());
        assert!(g.to_hamiltonian(&[0.0]).is_err());
    }

    #[test]
    fn test_normalized_laplacian_isolated_node() {
        let mut g = FiniteCausalGraph::new(3).unwrap();
        g.add_edge(0, 1, 1.0).unwrap();
        let l = g.to_normalized_laplacian();
        assert_eq!(l.get(0, 0), 1.0);
        assert!((l.get(0, 1) + 1.0).abs() < 1e-12);
        assert_eq!(l.get(2, 2), 0.0);
    }

    #[test]
    fn test_biased_laplacian() {
        let mut g = path(3);
        g.set_bias(vec![1.0, -2.0, 0.5]).unwrap();
        let l = g.to_biased_laplacian();
        assert_eq!(l.diagonal(), vec![2.0, 0.0, 1.5]);
        assert!(g.set_bias(vec![1.0]).is_err());
    }
}
