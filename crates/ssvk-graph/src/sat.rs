// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — 3-SAT → Ising Coupling Map
// ─────────────────────────────────────────────────────────────────────
//! Pairwise approximation of the 3-SAT clause penalty.
//!
//! For each clause (i, s_i, j, s_j, k, s_k):
//!   J[i,j] += s_i·s_j,  J[i,k] += s_i·s_k,  J[j,k] += s_j·s_k
//!   h[i]   += s_i,      h[j]   += s_j,      h[k]   += s_k
//!
//! The 3-body term is dropped. This is the MAX-3-SAT heuristic, not an
//! exact gadget reduction; no auxiliary variables are introduced.

use nalgebra::DMatrix;
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use ssvk_types::{SsvkError, SsvkResult};

use crate::graph::FiniteCausalGraph;

/// A signed variable occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub var: usize,
    /// −1 (negated) or +1.
    pub sign: i8,
}

/// Three literals over distinct variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause([Literal; 3]);

impl Clause {
    pub fn new(i: usize, si: i8, j: usize, sj: i8, k: usize, sk: i8) -> SsvkResult<Self> {
        for s in [si, sj, sk] {
            if s != 1 && s != -1 {
                return Err(SsvkError::InvalidParameters(format!(
                    "clause sign must be -1 or +1, got {s}"
                )));
            }
        }
        if i == j || i == k || j == k {
            return Err(SsvkError::InvalidParameters(format!(
                "clause variables must be distinct, got ({i}, {j}, {k})"
            )));
        }
        Ok(Self([
            Literal { var: i, sign: si },
            Literal { var: j, sign: sj },
            Literal { var: k, sign: sk },
        ]))
    }

    /// From the 6-tuple wire form (i, sign_i, j, sign_j, k, sign_k).
    pub fn from_tuple(t: (usize, i8, usize, i8, usize, i8)) -> SsvkResult<Self> {
        Self::new(t.0, t.1, t.2, t.3, t.4, t.5)
    }

    pub fn literals(&self) -> &[Literal; 3] {
        &self.0
    }

    pub fn touches(&self, var: usize) -> bool {
        self.0.iter().any(|l| l.var == var)
    }

    fn max_var(&self) -> usize {
        self.0.iter().map(|l| l.var).max().unwrap_or(0)
    }
}

/// A 3-SAT instance with its derived pairwise couplings.
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    n: usize,
    clauses: Vec<Clause>,
    coupling: DMatrix<f64>,
    bias: Vec<f64>,
}

impl ProblemInstance {
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Symmetric coupling matrix J (zero diagonal).
    pub fn coupling(&self) -> &DMatrix<f64> {
        &self.coupling
    }

    /// Bias vector h.
    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Clauses per variable.
    pub fn clause_ratio(&self) -> f64 {
        self.clauses.len() as f64 / self.n as f64
    }

    /// Number of clauses mentioning both `i` and `j`.
    pub fn shared_clause_count(&self, i: usize, j: usize) -> usize {
        self.clauses
            .iter()
            .filter(|c| c.touches(i) && c.touches(j))
            .count()
    }

    /// Coupling graph: edge {i, j} with weight J[i,j] wherever nonzero,
    /// bias h attached as the on-site vector.
    pub fn to_graph(&self) -> SsvkResult<FiniteCausalGraph> {
        let mut graph = FiniteCausalGraph::new(self.n)?;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let w = self.coupling[(i, j)];
                if w != 0.0 {
                    graph.add_edge(i, j, w)?;
                }
            }
        }
        graph.set_bias(self.bias.clone())?;
        Ok(graph)
    }
}

/// Build (J, h) for an explicit clause list over `n` variables.
pub fn load_sat_instance(n: usize, clauses: &[Clause]) -> SsvkResult<ProblemInstance> {
    if n == 0 {
        return Err(SsvkError::InvalidParameters(
            "3-SAT instance needs n >= 1 variables".to_string(),
        ));
    }
    if let Some(bad) = clauses.iter().find(|c| c.max_var() >= n) {
        return Err(SsvkError::InvalidParameters(format!(
            "clause {bad:?} references a variable outside [0, {n})"
        )));
    }

    let mut coupling = DMatrix::<f64>::zeros(n, n);
    let mut bias = vec![0.0; n];
    for clause in clauses {
        let lits = clause.literals();
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            let (la, lb) = (lits[a], lits[b]);
            let s = f64::from(la.sign) * f64::from(lb.sign);
            coupling[(la.var, lb.var)] += s;
            coupling[(lb.var, la.var)] += s;
        }
        for l in lits {
            bias[l.var] += f64::from(l.sign);
        }
    }

    Ok(ProblemInstance {
        n,
        clauses: clauses.to_vec(),
        coupling,
        bias,
    })
}

/// Random instance with ⌈ratio·n⌉ clauses, each over three distinct
/// uniformly chosen variables with independent uniform signs.
pub fn random_sat_instance<R: Rng + ?Sized>(
    n: usize,
    ratio: f64,
    rng: &mut R,
) -> SsvkResult<ProblemInstance> {
    if n < 3 {
        return Err(SsvkError::InvalidParameters(format!(
            "random 3-SAT needs n >= 3 variables, got {n}"
        )));
    }
    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(SsvkError::InvalidParameters(format!(
            "clause ratio must be finite and > 0, got {ratio}"
        )));
    }
    let m = (ratio * n as f64).ceil() as usize;
    let mut clauses = Vec::with_capacity(m);
    for _ in 0..m {
        let vars = sample(rng, n, 3);
        let mut sign = || if rng.gen::<bool>() { 1 } else { -1 };
        let (si, sj, sk) = (sign(), sign(), sign());
        clauses.push(Clause::new(
            vars.index(0),
            si,
            vars.index(1),
            sj,
            vars.index(2),
            sk,
        )?);
    }
    load_sat_instance(n, &clauses)
}
