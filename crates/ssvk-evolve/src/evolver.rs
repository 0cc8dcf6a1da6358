// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Entropic Evolver
// ─────────────────────────────────────────────────────────────────────
//! Batched Metropolis rewiring on spectral entropy.
//!
//! Each batch:
//!   1. snapshot the graph and remember S_before
//!   2. flip `check_interval` uniformly chosen vertex pairs
//!   3. recompute S_after
//!   4. keep if ΔS > 0, else keep with probability exp(β·ΔS) and
//!      restore the snapshot on rejection
//!
//! The authoritative state is always either the mutated graph or the
//! last accepted snapshot. The best accepted state is remembered; if the
//! walk ends below the input entropy, the best state is returned instead.

use rand::Rng;
use serde::{Deserialize, Serialize};

use ssvk_graph::{FiniteCausalGraph, GraphSnapshot};
use ssvk_spectral::SpectrumExtractor;
use ssvk_types::{Checkpoint, EvolverConfig, SsvkError, SsvkResult, Tolerances};

use crate::entropy::graph_entropy;

/// Log entry for one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionStep {
    pub batch: usize,
    /// Mutations applied in this batch.
    pub mutations: usize,
    pub s_before: f64,
    pub s_after: f64,
    pub accepted: bool,
    /// Edge count after the accept/reject decision.
    pub edges: usize,
}

/// Result of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    pub graph: FiniteCausalGraph,
    pub trace: Vec<EvolutionStep>,
    pub initial_entropy: f64,
    pub final_entropy: f64,
    pub accepted: usize,
    pub rejected: usize,
    /// The walk ended below the input entropy and the best accepted
    /// state was returned.
    pub ratcheted: bool,
}

/// Metropolis evolver on the Laplacian spectral entropy.
#[derive(Debug, Clone)]
pub struct EntropicEvolver {
    cfg: EvolverConfig,
    extractor: SpectrumExtractor,
}

impl EntropicEvolver {
    pub fn new(cfg: EvolverConfig, tol: Tolerances) -> SsvkResult<Self> {
        if cfg.check_interval == 0 {
            return Err(SsvkError::InvalidParameters(
                "evolver check_interval must be >= 1".to_string(),
            ));
        }
        if !(cfg.beta >= 0.0 && cfg.beta.is_finite()) {
            return Err(SsvkError::InvalidParameters(format!(
                "evolver beta must be finite and >= 0, got {}",
                cfg.beta
            )));
        }
        Ok(Self {
            cfg,
            extractor: SpectrumExtractor::new(tol),
        })
    }

    pub fn config(&self) -> &EvolverConfig {
        &self.cfg
    }

    /// Evolve `graph` for the configured step budget.
    ///
    /// `checkpoint` is probed before every batch.
    pub fn evolve<R, C>(
        &self,
        mut graph: FiniteCausalGraph,
        rng: &mut R,
        checkpoint: &C,
    ) -> SsvkResult<EvolutionOutcome>
    where
        R: Rng + ?Sized,
        C: Checkpoint + ?Sized,
    {
        let n = graph.node_count();
        if n < 2 {
            return Err(SsvkError::InvalidParameters(format!(
                "evolver needs at least 2 nodes, got {n}"
            )));
        }

        let initial = graph_entropy(&graph, &self.extractor)?;
        let mut current = initial;
        let mut best: (f64, GraphSnapshot) = (initial, graph.snapshot());
        let mut trace = Vec::with_capacity(self.cfg.steps.div_ceil(self.cfg.check_interval));
        let (mut accepted, mut rejected) = (0usize, 0usize);

        let mut remaining = self.cfg.steps;
        let mut batch = 0;
        while remaining > 0 {
            checkpoint.check()?;
            let mutations = remaining.min(self.cfg.check_interval);
            remaining -= mutations;

            let snapshot = graph.snapshot();
            for _ in 0..mutations {
                let (i, j) = random_pair(n, rng);
                graph.toggle_edge(i, j)?;
            }
            let after = graph_entropy(&graph, &self.extractor)?;
            let delta = after - current;
            let keep = delta > 0.0 || rng.gen::<f64>() < (self.cfg.beta * delta).exp();

            if keep {
                accepted += 1;
                if after > best.0 {
                    best = (after, graph.snapshot());
                }
            } else {
                rejected += 1;
                graph.restore(snapshot);
            }
            log::debug!(
                "evolve batch {batch}: S {current:.6} -> {after:.6} ({})",
                if keep { "accepted" } else { "rejected" }
            );
            trace.push(EvolutionStep {
                batch,
                mutations,
                s_before: current,
                s_after: after,
                accepted: keep,
                edges: graph.edge_count(),
            });
            if keep {
                current = after;
            }
            batch += 1;
        }

        let mut ratcheted = false;
        if current < initial {
            let (best_entropy, best_state) = best;
            graph.restore(best_state);
            log::debug!(
                "evolve: final S {current:.6} below input {initial:.6}, \
                 returning best {best_entropy:.6}"
            );
            current = best_entropy;
            ratcheted = true;
        }

        Ok(EvolutionOutcome {
            graph,
            trace,
            initial_entropy: initial,
            final_entropy: current,
            accepted,
            rejected,
            ratcheted,
        })
    }
}

/// Uniform unordered pair of distinct vertices.
fn random_pair<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let i = rng.gen_range(0..n);
    let mut j = rng.gen_range(0..n - 1);
    if j >= i {
        j += 1;
    }
    (i, j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssvk_graph::{build_random_regular, seeded_rng};
    use ssvk_types::Unbounded;

    fn evolver(steps: usize, check_interval: usize, beta: f64) -> EntropicEvolver {
        EntropicEvolver::new(
            EvolverConfig {
                steps,
                check_interval,
                beta,
            },
            Tolerances::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_never_ends_below_input() {
        for (seed, interval, beta) in [(1, 1, 0.0), (2, 7, 1.0), (3, 25, 10.0), (4, 3, 0.0)] {
            let g = build_random_regular(12, 3, &mut seeded_rng(seed)).unwrap();
            let out = evolver(150, interval, beta)
                .evolve(g, &mut seeded_rng(seed + 100), &Unbounded)
                .unwrap();
            let check = graph_entropy(&out.graph, &SpectrumExtractor::default()).unwrap();
            assert!(
                check >= out.initial_entropy - 1e-12,
                "seed {seed}: S_final {check} < S_input {}",
                out.initial_entropy
            );
            assert!((check - out.final_entropy).abs() < 1e-9);
        }
    }

    #[test]
    fn test_trace_shape() {
        let g = build_random_regular(10, 2, &mut seeded_rng(5)).unwrap();
        let out = evolver(23, 5, 2.0)
            .evolve(g, &mut seeded_rng(6), &Unbounded)
            .unwrap();
        assert_eq!(out.trace.len(), 5);
        assert_eq!(out.trace.last().map(|s| s.mutations), Some(3));
        assert_eq!(out.accepted + out.rejected, 5);
        assert!(out.graph.validate().is_ok());
    }

    #[test]
    fn test_rejection_restores_snapshot() {
        let g = build_random_regular(10, 4, &mut seeded_rng(8)).unwrap();
        let out = evolver(60, 4, 50.0)
            .evolve(g, &mut seeded_rng(9), &Unbounded)
            .unwrap();
        let mut prev = out.initial_entropy;
        for step in &out.trace {
            assert!((step.s_before - prev).abs() < 1e-12, "batch {}", step.batch);
            if step.accepted {
                prev = step.s_after;
            }
        }
    }

    #[test]
    fn test_seed_determinism() {
        let run = || {
            let g = build_random_regular(12, 3, &mut seeded_rng(1)).unwrap();
            evolver(80, 8, 3.0)
                .evolve(g, &mut seeded_rng(2), &Unbounded)
                .unwrap()
        };
        let (a, b) = (run(), run());
        assert_eq!(a.graph, b.graph);
        assert_eq!(a.final_entropy, b.final_entropy);
    }

    #[test]
    fn test_checkpoint_aborts() {
        struct Expired;
        impl Checkpoint for Expired {
            fn check(&self) -> SsvkResult<()> {
                Err(SsvkError::TimedOut {
                    elapsed_ms: 1,
                    budget_ms: 0,
                })
            }
        }
        let g = build_random_regular(8, 2, &mut seeded_rng(1)).unwrap();
        let res = evolver(10, 2, 1.0).evolve(g, &mut seeded_rng(1), &Expired);
        assert!(matches!(res, Err(SsvkError::TimedOut { .. })));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(EntropicEvolver::new(
            EvolverConfig {
                steps: 10,
                check_interval: 0,
                beta: 1.0
            },
            Tolerances::default()
        )
        .is_err());
        let single = FiniteCausalGraph::new(1).unwrap();
        assert!(evolver(10, 1, 1.0)
            .evolve(single, &mut seeded_rng(1), &Unbounded)
            .is_err());
    }
}
