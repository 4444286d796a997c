//! Benchmarks for dense kernels
//!
//! Compares the transpose and matrix product kernels against each other and
//! the sequential and concurrent elementwise paths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tenalg_core::{
    DenseTensor, Dispatcher, FixedPolicy, KernelConfig, MatMulAlgorithm, TransposeAlgorithm,
};

/// Pseudo-random dense tensor, reproducible across runs
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

fn bench_elementwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("elementwise_add");
    let sequential = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::sequential())
        .expect("valid config");
    let concurrent = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::concurrent())
        .expect("valid config");

    for size in [64, 256, 1024].iter() {
        let a = random_dense(&[*size, *size], 1);
        let b = random_dense(&[*size, *size], 2);
        group.throughput(Throughput::Elements((size * size) as u64));

        group.bench_with_input(BenchmarkId::new("sequential", size), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| black_box(a.add_with(b, &sequential).expect("add")))
        });
        group.bench_with_input(BenchmarkId::new("concurrent", size), &(&a, &b), |bench, (a, b)| {
            bench.iter(|| black_box(a.add_with(b, &concurrent).expect("add")))
        });
    }

    group.finish();
}

fn bench_transpose(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_transpose");

    for size in [32, 256, 1024].iter() {
        let a = random_dense(&[*size, *size + 3], 3);
        group.throughput(Throughput::Elements(a.len() as u64));

        for algorithm in [
            TransposeAlgorithm::Standard,
            TransposeAlgorithm::Blocked,
            TransposeAlgorithm::ConcurrentStandard,
            TransposeAlgorithm::ConcurrentBlocked,
        ] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", algorithm), size),
                &a,
                |bench, a| bench.iter(|| black_box(a.transpose_using(algorithm, 64).expect("transpose"))),
            );
        }
    }

    group.finish();
}

fn bench_matmul(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul");
    group.sample_size(20);

    for size in [16, 64, 192].iter() {
        let a = random_dense(&[*size, *size], 4);
        let b = random_dense(&[*size, *size], 5);
        group.throughput(Throughput::Elements((size * size * size) as u64));

        for algorithm in [
            MatMulAlgorithm::Standard,
            MatMulAlgorithm::Reordered,
            MatMulAlgorithm::Blocked,
            MatMulAlgorithm::Concurrent,
        ] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", algorithm), size),
                &(&a, &b),
                |bench, (a, b)| bench.iter(|| black_box(a.matmul_using(b, algorithm, 32).expect("matmul"))),
            );
        }
    }

    group.finish();
}

fn bench_tensor_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("tensor_dot");
    let a = random_dense(&[16, 24, 32], 6);
    let b = random_dense(&[32, 24, 8], 7);

    group.bench_function("contract_two_axes", |bench| {
        bench.iter(|| black_box(a.tensor_dot(&b, &[1, 2], &[1, 0]).expect("tensor_dot")))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_elementwise,
    bench_transpose,
    bench_matmul,
    bench_tensor_dot
);
criterion_main!(benches);
