// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Random and Lattice Graph Builders
// ─────────────────────────────────────────────────────────────────────

use rand::Rng;

use ssvk_types::{SsvkError, SsvkResult};

use crate::graph::FiniteCausalGraph;

/// Restarts before a random regular realisation is abandoned.
const REGULAR_MAX_RESTARTS: usize = 1000;

/// Random k-regular graph on n nodes with unit weights.
///
/// Stubs are paired uniformly at random, rejecting self-loops and
/// multi-edges; a dead end restarts the pairing.
pub fn build_random_regular<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> SsvkResult<FiniteCausalGraph> {
    if n == 0 {
        return Err(SsvkError::InvalidParameters(
            "random regular graph needs n >= 1".to_string(),
        ));
    }
    if k >= n {
        return Err(SsvkError::InvalidParameters(format!(
            "degree k={k} must be < n={n}"
        )));
    }
    if (n * k) % 2 == 1 {
        return Err(SsvkError::InvalidParameters(format!(
            "n·k must be even, got n={n}, k={k}"
        )));
    }

    for restart in 0..REGULAR_MAX_RESTARTS {
        let mut graph = FiniteCausalGraph::new(n)?;
        let mut stubs: Vec<usize> = (0..n)
            .flat_map(|i| std::iter::repeat(i).take(k))
            .collect();

        let mut stuck = false;
        while !stubs.is_empty() {
            let tries = (stubs.len() * 4).max(16);
            let mut paired = false;
            for _ in 0..tries {
                let a = rng.gen_range(0..stubs.len());
                let b = rng.gen_range(0..stubs.len());
                let (u, v) = (stubs[a], stubs[b]);
                if a == b || u == v || graph.has_edge(u, v) {
                    continue;
                }
                graph.add_edge(u, v, 1.0)?;
                let (hi, lo) = if a > b { (a, b) } else { (b, a) };
                stubs.swap_remove(hi);
                stubs.swap_remove(lo);
                paired = true;
                break;
            }
            if !paired {
                stuck = true;
                break;
            }
        }

        if !stuck {
            if restart > 0 {
                log::debug!("random regular n={n} k={k} realised after {restart} restarts");
            }
            return Ok(graph);
        }
    }

    Err(SsvkError::InvalidParameters(format!(
        "could not realise a {k}-regular graph on {n} nodes"
    )))
}

/// Connectivity threshold r_c(n) = sqrt(ln n / (π n)) of the random
/// geometric graph in the unit square.
pub fn percolation_radius(n: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let n = n as f64;
    (n.ln() / (std::f64::consts::PI * n)).sqrt()
}

/// Random geometric graph: n uniform points in the unit square, unit
/// edges between points at Euclidean distance ≤ r.
pub fn build_geometric<R: Rng + ?Sized>(
    n: usize,
    r: f64,
    rng: &mut R,
) -> SsvkResult<FiniteCausalGraph> {
    if !(r.is_finite() && r >= 0.0) {
        return Err(SsvkError::InvalidParameters(format!(
            "radius must be finite and >= 0, got {r}"
        )));
    }
    let mut graph = FiniteCausalGraph::new(n)?;
    let points: Vec<(f64, f64)> = (0..n).map(|_| (rng.gen::<f64>(), rng.gen::<f64>())).collect();
    let r2 = r * r;
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = points[i].0 - points[j].0;
            let dy = points[i].1 - points[j].1;
            if dx * dx + dy * dy <= r2 {
                graph.add_edge(i, j, 1.0)?;
            }
        }
    }
    Ok(graph)
}

/// Erdős–Rényi G(n, p) with unit weights.
pub fn build_erdos_renyi<R: Rng + ?Sized>(
    n: usize,
    p: f64,
    rng: &mut R,
) -> SsvkResult<FiniteCausalGraph> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SsvkError::InvalidParameters(format!(
            "edge probability must be in [0, 1], got {p}"
        )));
    }
    let mut graph = FiniteCausalGraph::new(n)?;
    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < p {
                graph.add_edge(i, j, 1.0)?;
            }
        }
    }
    Ok(graph)
}

/// Hypercubic lattice with side `side` in `dims` dimensions.
///
/// Node index is mixed-radix: coordinate c_d contributes c_d · side^d.
/// With `periodic`, each axis wraps around.
pub fn build_grid(side: usize, dims: usize, periodic: bool) -> SsvkResult<FiniteCausalGraph> {
    if side == 0 || dims == 0 {
        return Err(SsvkError::InvalidParameters(format!(
            "grid needs side >= 1 and dims >= 1, got side={side}, dims={dims}"
        )));
    }
    let n = u32::try_from(dims)
        .ok()
        .and_then(|d| side.checked_pow(d))
        .ok_or_else(|| {
            SsvkError::InvalidParameters(format!("grid {side}^{dims} overflows"))
        })?;

    let mut graph = FiniteCausalGraph::new(n)?;
    for i in 0..n {
        let mut stride = 1;
        for _ in 0..dims {
            let coord = (i / stride) % side;
            let next = if coord + 1 < side {
                Some(i + stride)
            } else if periodic {
                Some(i + stride - side * stride)
            } else {
                None
            };
            if let Some(j) = next {
                if j != i {
                    graph.add_edge(i, j, 1.0)?;
                }
            }
            stride *= side;
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seeded_rng;

    #[test]
    fn test_regular_degrees() {
        let mut rng = seeded_rng(1);
        let g = build_random_regular(50, 4, &mut rng).unwrap();
        assert_eq!(g.edge_count(), 100);
        for i in 0..50 {
            assert_eq!(g.degree(i), 4, "node {i}");
        }
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_regular_odd_product_rejected() {
        let mut rng = seeded_rng(1);
        assert!(matches!(
            build_random_regular(7, 3, &mut rng),
            Err(SsvkError::InvalidParameters(_))
        ));
        assert!(build_random_regular(4, 4, &mut rng).is_err());
    }

    #[test]
    fn test_regular_is_seed_deterministic() {
        let a = build_random_regular(30, 3, &mut seeded_rng(9)).unwrap();
        let b = build_random_regular(30, 3, &mut seeded_rng(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_geometric_giant_component_above_threshold() {
        let n = 500;
        let r = 2.0 * percolation_radius(n);
        let g = build_geometric(n, r, &mut seeded_rng(3)).unwrap();
        let giant = g.component_sizes()[0];
        assert!(giant as f64 >= 0.9 * n as f64, "giant component {giant}/{n}");
    }

    #[test]
    fn test_geometric_zero_radius_is_edgeless() {
        let g = build_geometric(20, 0.0, &mut seeded_rng(3)).unwrap();
        assert_eq!(g.edge_count(), 0);
        assert!(build_geometric(20, f64::NAN, &mut seeded_rng(3)).is_err());
    }

    #[test]
    fn test_erdos_renyi_extremes() {
        let full = build_erdos_renyi(10, 1.0, &mut seeded_rng(2)).unwrap();
        assert_eq!(full.edge_count(), 45);
        let none = build_erdos_renyi(10, 0.0, &mut seeded_rng(2)).unwrap();
        assert_eq!(none.edge_count(), 0);
        assert!(build_erdos_renyi(10, 1.5, &mut seeded_rng(2)).is_err());
    }

    #[test]
    fn test_periodic_grid_is_4_regular() {
        let g = build_grid(8, 2, true).unwrap();
        assert_eq!(g.node_count(), 64);
        assert_eq!(g.edge_count(), 128);
        assert!((0..64).all(|i| g.degree(i) == 4));
    }

    #[test]
    fn test_open_grid_edges() {
        let g = build_grid(3, 2, false).unwrap();
        assert_eq!(g.edge_count(), 12);
        let line = build_grid(5, 1, false).unwrap();
        assert_eq!(line.edge_count(), 4);
        let ring = build_grid(5, 1, true).unwrap();
        assert_eq!(ring.edge_count(), 5);
    }

    #[test]
    fn test_grid_rejects_degenerate() {
        assert!(build_grid(0, 2, true).is_err());
        assert!(build_grid(4, 0, true).is_err());
    }
}
