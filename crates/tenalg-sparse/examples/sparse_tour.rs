//! Sparse Formats Tour
//!
//! Walks through the coordinate and compressed-row formats:
//! - building COO tensors from unsorted, duplicated entries
//! - sorted merges, reductions and traces
//! - CSR products with sequential and concurrent dispatch
//! - mixed dense/sparse kernels
//!
//! Run with: cargo run -p tenalg-sparse --example sparse_tour

use tenalg_core::{DenseTensor, Dispatcher, FixedPolicy, KernelConfig, Shape};
use tenalg_sparse::{mixed, CooMatrix, CooTensor, CooVector, CsrMatrix};

fn main() -> anyhow::Result<()> {
    println!("=== tenalg-sparse: Format Tour ===\n");

    // 1. Unsorted input with a duplicate coordinate
    println!("1. Building a 4x4 COO tensor from unsorted entries...");
    let a = CooTensor::new(
        Shape::new(&[4, 4]),
        vec![vec![3, 1], vec![0, 0], vec![2, 2], vec![0, 0], vec![1, 3]],
        vec![4.0, 1.0, 3.0, 2.0, 5.0],
    )?;
    println!(
        "   nnz = {}, canonical = {}, density = {:.1}%",
        a.nnz(),
        a.is_canonical(),
        a.density() * 100.0
    );
    let canonical = a.coalesce();
    println!(
        "   after coalesce: nnz = {}, value at (0, 0) = {}\n",
        canonical.nnz(),
        canonical.get(&[0, 0])?
    );

    // 2. Sorted merges
    println!("2. Merging with a second tensor...");
    let b = CooTensor::new(
        Shape::new(&[4, 4]),
        vec![vec![0, 0], vec![3, 3]],
        vec![10.0, 7.0],
    )?;
    let sum = a.add(&b)?;
    let product = a.elem_mult(&b)?;
    println!("   A + B has {} stored entries", sum.nnz());
    println!("   A ⊙ B has {} stored entries", product.nnz());
    println!("   trace(A + B) = {:?}", sum.tensor_tr(0, 1)?.values());
    println!(
        "   max entry {:?} at {:?}\n",
        sum.max(),
        sum.argmax()
    );

    // 3. CSR products
    println!("3. Converting to CSR and multiplying...");
    let csr = CsrMatrix::from_coo(&CooMatrix::from_tensor(&sum)?);
    println!(
        "   CSR: {}x{}, row_ptr = {:?}",
        csr.nrows(),
        csr.ncols(),
        csr.row_ptr()
    );
    let x = DenseTensor::vector(vec![1.0, 2.0, 3.0, 4.0]);
    println!("   A x = {:?}", csr.mat_vec(&x)?.data());

    let rhs = DenseTensor::<f64>::ones(&[4, 2]);
    let sequential = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::sequential())?;
    let concurrent = Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::concurrent())?;
    let seq = csr.mat_mul_dense_with(&rhs, &sequential)?;
    let par = csr.mat_mul_dense_with(&rhs, &concurrent)?;
    println!("   sequential == concurrent: {}\n", seq == par);

    // 4. Mixed kernels
    println!("4. Mixed dense/sparse kernels...");
    let dense = DenseTensor::<f64>::ones(&[4, 4]);
    let shifted = mixed::add_dense_coo(&dense, &a)?;
    println!("   ones + A, first row = {:?}", &shifted.data()[..4]);
    let scaled = mixed::elem_div_coo_dense(&a, &DenseTensor::full(&[4, 4], 2.0))?;
    println!("   A ⊘ 2 keeps {} stored entries", scaled.nnz());

    // 5. Sparse vectors
    println!("\n5. Sparse vectors...");
    let u = CooVector::new(6, vec![0, 4], vec![3.0, 4.0])?;
    let v = CooVector::new(6, vec![4, 5], vec![1.0, 2.0])?;
    println!("   u · v = {}, ||u|| = {}", u.dot(&v)?, u.norm());

    println!("\n=== Tour complete ===");
    Ok(())
}
