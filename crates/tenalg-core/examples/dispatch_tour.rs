//! Kernel dispatch walkthrough.
//!
//! Shows how the dispatcher picks kernels for small and large operands, how
//! a custom policy is injected, and what the recent-shape cache records.
//!
//! Run with:
//! ```bash
//! RUST_LOG=tenalg_core=debug cargo run --example dispatch_tour --features logging
//! ```

use scirs2_core::num_complex::Complex64;
use tenalg_core::logging::{init_logging, LogConfig, LogFormat};
use tenalg_core::{
    DenseTensor, Dispatcher, FixedPolicy, KernelConfig, Operation, Shape,
};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig {
        format: LogFormat::Compact,
        ..LogConfig::default()
    })?;

    println!("=== tenalg: Kernel Dispatch ===\n");

    example_thresholds()?;
    example_fixed_policy()?;
    example_hermitian()?;

    println!("\n=== Done ===");
    Ok(())
}

fn example_thresholds() -> anyhow::Result<()> {
    println!("--- Threshold policy ---");

    let dispatcher = Dispatcher::new(KernelConfig::new().elementwise_threshold(10_000))?;
    for dims in [[8, 8], [200, 200]] {
        let shape = Shape::new(&dims);
        let execution = dispatcher.elementwise(Operation::Add, &shape);
        let transpose = dispatcher.transpose(&shape, &Shape::new(&[dims[1], dims[0]]), false);
        let matmul = dispatcher.matmul(&shape, &shape);
        println!("  {}: add={:?} transpose={:?} matmul={:?}", shape, execution, transpose, matmul);
    }

    // Repeated shapes hit the cache
    let a = DenseTensor::<f64>::ones(&[200, 200]);
    for _ in 0..3 {
        a.add_with(&a, &dispatcher)?;
    }
    let stats = dispatcher.cache_stats();
    println!(
        "  cache: {} entries, {} hits, {} misses, hit rate {:.2}",
        stats.entries,
        stats.hits,
        stats.misses,
        stats.hit_rate()
    );
    Ok(())
}

fn example_fixed_policy() -> anyhow::Result<()> {
    println!("\n--- Fixed policy ---");

    let dispatcher = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::concurrent())?;
    let a = DenseTensor::from_vec((0..12).map(f64::from).collect(), &[3, 4])?;
    let at = a.transpose_axes_with(0, 1, &dispatcher)?;
    let gram = a.matmul_with(&at, &dispatcher)?;
    println!("  A A^T = {:?}", gram.data());
    Ok(())
}

fn example_hermitian() -> anyhow::Result<()> {
    println!("\n--- Conjugate transpose ---");

    let z = DenseTensor::from_vec(
        vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(2.0, 1.0),
            Complex64::new(2.0, -1.0),
            Complex64::new(3.0, 0.0),
        ],
        &[2, 2],
    )?;
    println!("  hermitian: {}", z.is_hermitian());
    println!("  Z^H == Z: {}", z.herm_transpose()? == z);
    Ok(())
}
