//! Benchmarks for the SVD truncation and the NMF solver.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ratingfill_approx::{nmf::NonnegativeFactorizer, truncated_svd, MultiplicativeUpdate};
use ratingfill_core::types::DMatrix;

/// Dense matrix with ratings-like entries in `[0.5, 5.0]`.
fn synthetic_matrix(n_rows: usize, n_cols: usize) -> DMatrix {
    DMatrix::from_fn(n_rows, n_cols, |i, j| 0.5 + ((i * 7 + j * 13) % 10) as f64 * 0.5)
}

fn bench_svd(c: &mut Criterion) {
    let mut group = c.benchmark_group("truncated_svd");
    for &(rows, cols) in &[(50_usize, 200_usize), (150, 600)] {
        let matrix = synthetic_matrix(rows, cols);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{rows}x{cols}")),
            &matrix,
            |b, matrix| {
                b.iter(|| truncated_svd(black_box(matrix), 5).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_nmf(c: &mut Criterion) {
    let matrix = synthetic_matrix(150, 600);
    let solver = MultiplicativeUpdate::new().with_max_iterations(50);
    c.bench_function("nmf_150x600_r10", |b| {
        b.iter(|| solver.factorize(black_box(&matrix), 10).unwrap());
    });
}

criterion_group!(benches, bench_svd, bench_nmf);
criterion_main!(benches);
