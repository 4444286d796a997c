//! Mixed dense/sparse kernels
//!
//! Dense ⊕ sparse kernels clone the dense operand and visit only the stored
//! sparse entries, so their cost beyond the clone is O(nnz).
//!
//! Products with an implicit zero stay sparse: [`elem_mult_dense_coo`] and
//! [`elem_mult_dense_csr`] keep the coordinate set of the sparse operand.
//! [`elem_div_coo_dense`] follows the same rule, so positions where the
//! sparse operand is implicitly zero are never divided, even when `0 / x`
//! would be defined.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::{DenseTensor, Shape};
//! use tenalg_sparse::{mixed, CooTensor};
//!
//! let sparse = CooTensor::new(
//!     Shape::new(&[3, 3]),
//!     vec![vec![0, 0], vec![1, 2]],
//!     vec![2.0, 3.0],
//! )
//! .unwrap();
//! let ones = DenseTensor::<f64>::ones(&[3, 3]);
//!
//! let sum = mixed::add_dense_coo(&ones, &sparse).unwrap();
//! assert_eq!(sum.data(), &[3.0, 1.0, 1.0, 1.0, 1.0, 4.0, 1.0, 1.0, 1.0]);
//! ```

use tenalg_core::dense::types::checked_len;
use tenalg_core::error::ensure_same_shape;
use tenalg_core::{DenseTensor, Field, Ring, Semiring, TensorError};

use crate::coo::CooTensor;
use crate::coo_matrix::CooMatrix;
use crate::csr::CsrMatrix;
use crate::error::Result;

/// Fold every stored entry of `sparse` into `dest` with `op(dest, value)`.
fn scatter_coo<T, F>(dest: &mut DenseTensor<T>, sparse: &CooTensor<T>, op: F)
where
    T: Semiring,
    F: Fn(&T, &T) -> T,
{
    let shape = sparse.shape().clone();
    let data = dest.data_mut();
    for (index, value) in sparse.indices().iter().zip(sparse.values()) {
        let flat = shape.flat_index_unchecked(index);
        data[flat] = op(&data[flat], value);
    }
}

/// `dense + sparse`
pub fn add_dense_coo<T: Semiring>(
    dense: &DenseTensor<T>,
    sparse: &CooTensor<T>,
) -> Result<DenseTensor<T>> {
    let mut out = dense.clone();
    add_assign_dense_coo(&mut out, sparse)?;
    Ok(out)
}

/// `dense += sparse`
pub fn add_assign_dense_coo<T: Semiring>(
    dense: &mut DenseTensor<T>,
    sparse: &CooTensor<T>,
) -> Result<()> {
    ensure_same_shape("add", dense.dims(), sparse.dims())?;
    scatter_coo(dense, sparse, |d, s| d.add(s));
    Ok(())
}

/// `dense - sparse`
pub fn sub_dense_coo<T: Ring>(
    dense: &DenseTensor<T>,
    sparse: &CooTensor<T>,
) -> Result<DenseTensor<T>> {
    let mut out = dense.clone();
    sub_assign_dense_coo(&mut out, sparse)?;
    Ok(out)
}

/// `dense -= sparse`
pub fn sub_assign_dense_coo<T: Ring>(
    dense: &mut DenseTensor<T>,
    sparse: &CooTensor<T>,
) -> Result<()> {
    ensure_same_shape("sub", dense.dims(), sparse.dims())?;
    scatter_coo(dense, sparse, |d, s| d.sub(s));
    Ok(())
}

/// `sparse - dense`
pub fn sub_coo_dense<T: Ring>(
    sparse: &CooTensor<T>,
    dense: &DenseTensor<T>,
) -> Result<DenseTensor<T>> {
    ensure_same_shape("sub", sparse.dims(), dense.dims())?;
    let mut out = dense.neg();
    scatter_coo(&mut out, sparse, |d, s| d.add(s));
    Ok(out)
}

/// Elementwise `dense ⊙ sparse`, sparse with the coordinates of `sparse`.
pub fn elem_mult_dense_coo<T: Semiring>(
    dense: &DenseTensor<T>,
    sparse: &CooTensor<T>,
) -> Result<CooTensor<T>> {
    ensure_same_shape("elem_mult", dense.dims(), sparse.dims())?;
    let shape = sparse.shape();
    let values = sparse
        .indices()
        .iter()
        .zip(sparse.values())
        .map(|(index, value)| dense.data()[shape.flat_index_unchecked(index)].mult(value))
        .collect();
    Ok(CooTensor::from_parts(
        shape.clone(),
        sparse.indices().to_vec(),
        values,
    ))
}

/// Elementwise `sparse ÷ dense` over the stored coordinates of `sparse`.
///
/// Implicit zeros of `sparse` stay implicit; division by a zero dense entry
/// yields the field's infinity/NaN rather than an error.
pub fn elem_div_coo_dense<T: Field>(
    sparse: &CooTensor<T>,
    dense: &DenseTensor<T>,
) -> Result<CooTensor<T>> {
    ensure_same_shape("elem_div", sparse.dims(), dense.dims())?;
    let shape = sparse.shape();
    let values = sparse
        .indices()
        .iter()
        .zip(sparse.values())
        .map(|(index, value)| value.div(&dense.data()[shape.flat_index_unchecked(index)]))
        .collect();
    Ok(CooTensor::from_parts(
        shape.clone(),
        sparse.indices().to_vec(),
        values,
    ))
}

fn ensure_vector_len<T>(op: &str, vector: &DenseTensor<T>, len: usize, lhs: &[usize]) -> Result<()> {
    if vector.rank() != 1 || vector.len() != len {
        return Err(TensorError::shape_mismatch(op, lhs, vector.dims()).into());
    }
    Ok(())
}

/// Dense `sparse + row` with `row` (length `ncols`) broadcast to every row.
pub fn add_to_each_row<T: Semiring>(
    sparse: &CooMatrix<T>,
    row: &DenseTensor<T>,
) -> Result<DenseTensor<T>> {
    ensure_vector_len("add_to_each_row", row, sparse.ncols(), sparse.dims())?;
    let (nrows, ncols) = (sparse.nrows(), sparse.ncols());
    let mut data = Vec::with_capacity(checked_len::<T>(sparse.shape())?);
    for _ in 0..nrows {
        data.extend_from_slice(row.data());
    }
    for (r, c, v) in sparse.iter() {
        let slot = &mut data[r * ncols + c];
        *slot = slot.add(v);
    }
    Ok(DenseTensor::new(sparse.shape().clone(), data)?)
}

/// Dense `sparse + col` with `col` (length `nrows`) broadcast to every column.
pub fn add_to_each_col<T: Semiring>(
    sparse: &CooMatrix<T>,
    col: &DenseTensor<T>,
) -> Result<DenseTensor<T>> {
    ensure_vector_len("add_to_each_col", col, sparse.nrows(), sparse.dims())?;
    let ncols = sparse.ncols();
    let mut data = Vec::with_capacity(checked_len::<T>(sparse.shape())?);
    for value in col.data() {
        data.extend(std::iter::repeat(value.clone()).take(ncols));
    }
    for (r, c, v) in sparse.iter() {
        let slot = &mut data[r * ncols + c];
        *slot = slot.add(v);
    }
    Ok(DenseTensor::new(sparse.shape().clone(), data)?)
}

/// Combine a dense matrix with a CSR matrix over the stored entries only.
///
/// The dense operand is cloned through `unary`, then every stored entry
/// `(i, j, v)` updates `out[i, j] = op(out[i, j], v)`. Entries not stored in
/// `csr` keep `unary(dense[i, j])`, so `op` must treat the sparse zero as its
/// identity. Subtracting the dense operand is `op = add, unary = neg`.
pub fn apply_csr_dense<T, F, U>(
    csr: &CsrMatrix<T>,
    dense: &DenseTensor<T>,
    op: F,
    unary: U,
) -> Result<DenseTensor<T>>
where
    T: Semiring,
    F: Fn(&T, &T) -> T,
    U: Fn(&T) -> T,
{
    ensure_same_shape("apply_bin_op", dense.dims(), csr.dims())?;
    let mut out = dense.map(unary);
    let ncols = csr.ncols();
    let data = out.data_mut();
    csr.for_each_entry(|r, c, v| {
        let slot = &mut data[r * ncols + c];
        *slot = op(slot, v);
    });
    Ok(out)
}

/// `dense + csr`
pub fn add_dense_csr<T: Semiring>(
    dense: &DenseTensor<T>,
    csr: &CsrMatrix<T>,
) -> Result<DenseTensor<T>> {
    apply_csr_dense(csr, dense, |d, s| d.add(s), T::clone)
}

/// `dense - csr`
pub fn sub_dense_csr<T: Ring>(
    dense: &DenseTensor<T>,
    csr: &CsrMatrix<T>,
) -> Result<DenseTensor<T>> {
    apply_csr_dense(csr, dense, |d, s| d.sub(s), T::clone)
}

/// `csr - dense`
pub fn sub_csr_dense<T: Ring>(
    csr: &CsrMatrix<T>,
    dense: &DenseTensor<T>,
) -> Result<DenseTensor<T>> {
    apply_csr_dense(csr, dense, |d, s| d.add(s), T::add_inv)
}

/// Dense `csr + scalar`, the scalar added to every entry.
pub fn add_scalar_csr<T: Semiring>(csr: &CsrMatrix<T>, scalar: &T) -> Result<DenseTensor<T>> {
    let len = checked_len::<T>(csr.shape())?;
    let mut out = DenseTensor::new(csr.shape().clone(), vec![scalar.clone(); len])?;
    let ncols = csr.ncols();
    let data = out.data_mut();
    csr.for_each_entry(|r, c, v| {
        let slot = &mut data[r * ncols + c];
        *slot = slot.add(v);
    });
    Ok(out)
}

/// Elementwise `dense ⊙ csr`, with the sparsity pattern of `csr`.
pub fn elem_mult_dense_csr<T: Semiring>(
    dense: &DenseTensor<T>,
    csr: &CsrMatrix<T>,
) -> Result<CsrMatrix<T>> {
    ensure_same_shape("elem_mult", dense.dims(), csr.dims())?;
    let ncols = csr.ncols();
    let data = dense.data();
    Ok(csr.map_entries(|r, c, v| data[r * ncols + c].mult(v)))
}
