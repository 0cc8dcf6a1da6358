// ─────────────────────────────────────────────────────────────────────
// Tamesis SSVK — Spectral Statistics Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the spectral hot paths:
//!   - Dense full spectrum (GUE, graph Laplacian)
//!   - Lanczos lowest-k on a large sparse Laplacian
//!   - Polynomial unfolding
//!   - Histogram classification

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use rand_distr::Exp1;

use ssvk_graph::{build_gue, build_random_regular, seeded_rng, OperatorKind, SymmetricOperator};
use ssvk_spectral::{spectrum_full, Classifier, SpectrumExtractor, Unfolder};
use ssvk_types::Tolerances;

// ── Helpers ───────────────────────────────────────────────────────────

fn regular_laplacian(n: usize) -> SymmetricOperator {
    let g = build_random_regular(n, 4, &mut seeded_rng(1)).unwrap();
    SymmetricOperator::from_graph(&g, &OperatorKind::Laplacian).unwrap()
}

fn gue_levels(n: usize) -> Vec<f64> {
    let h = build_gue(n, &mut seeded_rng(42)).unwrap();
    spectrum_full(&SymmetricOperator::Hermitian(h))
        .unwrap()
        .into_values()
}

// ── Extraction ───────────────────────────────────────────────────────

fn bench_full_gue_200(c: &mut Criterion) {
    let op = SymmetricOperator::Hermitian(build_gue(200, &mut seeded_rng(42)).unwrap());
    c.bench_function("spectrum_full_gue_200", |b| {
        b.iter(|| spectrum_full(black_box(&op)).unwrap())
    });
}

fn bench_full_laplacian_300(c: &mut Criterion) {
    let op = regular_laplacian(300);
    c.bench_function("spectrum_full_laplacian_300", |b| {
        b.iter(|| spectrum_full(black_box(&op)).unwrap())
    });
}

fn bench_lanczos_lowest_2000(c: &mut Criterion) {
    let op = regular_laplacian(2000);
    let extractor = SpectrumExtractor::new(Tolerances::default());
    c.bench_function("lanczos_lowest2_laplacian_2000", |b| {
        b.iter(|| extractor.lowest(black_box(&op), 2).unwrap())
    });
}

// ── Statistics ───────────────────────────────────────────────────────

fn bench_unfold_300(c: &mut Criterion) {
    let levels = gue_levels(300);
    let unfolder = Unfolder::default();
    c.bench_function("unfold_gue_300", |b| {
        b.iter(|| unfolder.unfold(black_box(&levels)).unwrap())
    });
}

fn bench_classify_5000(c: &mut Criterion) {
    let mut rng = seeded_rng(7);
    let spacings: Vec<f64> = (0..5000).map(|_| rng.sample(Exp1)).collect();
    let classifier = Classifier::default();
    c.bench_function("classify_5000_spacings", |b| {
        b.iter(|| classifier.classify_spacings(black_box(&spacings)))
    });
}

criterion_group!(
    extraction,
    bench_full_gue_200,
    bench_full_laplacian_300,
    bench_lanczos_lowest_2000,
);

criterion_group!(statistics, bench_unfold_300, bench_classify_5000,);

criterion_main!(extraction, statistics);
