//! Benchmarks for sparse tensor operations
//!
//! Compares sorted-merge kernels on canonical and unsorted operands, sparse
//! products against the dense baseline and sequential against row-partitioned
//! execution.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tenalg_core::{DenseTensor, Dispatcher, FixedPolicy, KernelConfig};
use tenalg_sparse::{mixed, CooMatrix, CooTensor, CsrMatrix};

/// Pseudo-random sparse matrix with roughly `density * nrows * ncols` entries
fn random_coo_matrix(nrows: usize, ncols: usize, density: f64, mut seed: u64) -> CooMatrix<f64> {
    let nnz = ((nrows * ncols) as f64 * density).max(1.0) as usize;
    let mut rows = Vec::with_capacity(nnz);
    let mut cols = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for _ in 0..nnz {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        rows.push((seed % nrows as u64) as usize);
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        cols.push((seed % ncols as u64) as usize);
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        values.push((seed % 10000) as f64 / 10000.0);
    }
    CooMatrix::new(nrows, ncols, rows, cols, values).expect("Failed to create COO")
}

fn random_dense(dims: &[usize], mut seed: u64) -> DenseTensor<f64> {
    let n: usize = dims.iter().product();
    let data = (0..n)
        .map(|_| {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            (seed % 10000) as f64 / 10000.0
        })
        .collect();
    DenseTensor::from_vec(data, dims).expect("Failed to create tensor")
}

fn bench_coo_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("coo_add");

    for size in [100, 500, 1000].iter() {
        let a = random_coo_matrix(*size, *size, 0.01, 1).to_tensor();
        let b = random_coo_matrix(*size, *size, 0.01, 2).to_tensor();
        let (ca, cb) = (a.coalesce(), b.coalesce());
        group.throughput(Throughput::Elements((a.nnz() + b.nnz()) as u64));

        group.bench_with_input(BenchmarkId::new("canonical", size), &(&ca, &cb), |bench, (a, b)| {
            bench.iter(|| black_box(a.add(b).expect("add")))
        });
        group.bench_with_input(BenchmarkId::new("unsorted", size), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| black_box(a.add(b).expect("add")))
        });
    }

    group.finish();
}

fn bench_csr_mat_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("csr_mat_mul_dense");
    group.sample_size(20);
    let sequential = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::sequential())
        .expect("valid config");
    let concurrent = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::concurrent())
        .expect("valid config");

    for size in [128, 512].iter() {
        let csr = random_coo_matrix(*size, *size, 0.02, 3).to_csr();
        let dense = random_dense(&[*size, 64], 4);
        let dense_t = dense.transpose().expect("transpose");
        let lhs = csr.to_dense().expect("to_dense");
        group.throughput(Throughput::Elements((csr.nnz() * 64) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", size), &csr, |bench, csr| {
            bench.iter(|| black_box(csr.mat_mul_dense_with(&dense, &sequential).expect("spmm")))
        });
        group.bench_with_input(BenchmarkId::new("concurrent", size), &csr, |bench, csr| {
            bench.iter(|| black_box(csr.mat_mul_dense_with(&dense, &concurrent).expect("spmm")))
        });
        group.bench_with_input(BenchmarkId::new("implicit_transpose", size), &csr, |bench, csr| {
            bench.iter(|| black_box(csr.mat_mul_dense_transposed(&dense_t).expect("spmm")))
        });
        group.bench_with_input(BenchmarkId::new("dense_baseline", size), &lhs, |bench, lhs| {
            bench.iter(|| black_box(lhs.matmul(&dense).expect("matmul")))
        });
    }

    group.finish();
}

fn bench_mat_vec(c: &mut Criterion) {
    let mut group = c.benchmark_group("mat_vec");

    for size in [1000, 5000].iter() {
        let coo = random_coo_matrix(*size, *size, 0.001, 5);
        let csr = coo.to_csr();
        let x = random_dense(&[*size], 6);

        group.bench_with_input(BenchmarkId::new("csr", size), &csr, |bench, csr| {
            bench.iter(|| black_box(csr.mat_vec(&x).expect("spmv")))
        });
        group.bench_with_input(BenchmarkId::new("coo", size), &coo, |bench, coo| {
            bench.iter(|| black_box(coo.mat_vec(&x).expect("spmv")))
        });
    }

    group.finish();
}

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_add");
    let size = 1000;
    let coo: CooTensor<f64> = random_coo_matrix(size, size, 0.01, 7).to_tensor();
    let csr = CsrMatrix::from_coo(&CooMatrix::from_tensor(&coo).expect("rank 2"));
    let dense = random_dense(&[size, size], 8);

    group.bench_function("dense_plus_coo", |bench| {
        bench.iter(|| black_box(mixed::add_dense_coo(&dense, &coo).expect("add")))
    });
    group.bench_function("dense_plus_csr", |bench| {
        bench.iter(|| black_box(mixed::add_dense_csr(&dense, &csr).expect("add")))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_coo_merge,
    bench_csr_mat_mul,
    bench_mat_vec,
    bench_mixed
);
criterion_main!(benches);
