// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Graph/Operator Builder
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Finite discrete structures for spectral validation: causal graphs,
//! random-graph models, lattice grids, Gaussian ensembles, and the
//! pairwise 3-SAT → Ising coupling map, plus the symmetric operators
//! (adjacency, Laplacian, entropic Hamiltonian) derived from them.
//!
//! Layout:
//!   - `graph`: arena of nodes with sorted neighbour maps + snapshots
//!   - `builders`: random regular, geometric, Erdős–Rényi, grid
//!   - `ensembles`: GUE (complex Hermitian) and GOE (real symmetric)
//!   - `sat`: clause validation and (J, h) assembly
//!   - `csr`: compressed sparse row storage
//!   - `operator`: the `SymmetricOperator` capability
//!   - `seed`: deterministic per-sample generator derivation

pub mod builders;
pub mod csr;
pub mod ensembles;
pub mod graph;
pub mod operator;
pub mod sat;
pub mod seed;

pub use builders::{
    build_erdos_renyi, build_geometric, build_grid, build_random_regular, percolation_radius,
};
pub use csr::CsrMatrix;
pub use ensembles::{build_goe, build_gue};
pub use graph::{FiniteCausalGraph, GraphSnapshot, NodeId};
pub use operator::{DenseView, OperatorKind, SymmetricOperator};
pub use sat::{load_sat_instance, random_sat_instance, Clause, Literal, ProblemInstance};
pub use seed::{derive_seed, seeded_rng, SampleRng};
