//! CSR (Compressed Sparse Row) format for 2D matrices
//!
//! CSR is the standard format for row-wise sparse kernels.
//!
//! # Format
//!
//! For an m×n sparse matrix with nnz stored entries:
//! - `row_ptr`: `Vec<usize>` of length m+1; row `i` occupies
//!   `row_ptr[i]..row_ptr[i+1]`, `row_ptr[0] == 0`, `row_ptr[m] == nnz`
//! - `col_indices`: `Vec<usize>` of length nnz
//! - `values`: `Vec<T>` of length nnz
//!
//! Merge-based kernels need strictly increasing column indices within each
//! row. [`CsrMatrix::new`] accepts any order; kernels check
//! [`CsrMatrix::has_sorted_rows`] and normalise with
//! [`CsrMatrix::sort_rows`] when it fails.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::DenseTensor;
//! use tenalg_sparse::CsrMatrix;
//!
//! // [2 0]
//! // [0 3]
//! let csr = CsrMatrix::new(vec![0, 1, 2], vec![0, 1], vec![2.0, 3.0], (2, 2)).unwrap();
//! let x = DenseTensor::vector(vec![1.0, 1.0]);
//! assert_eq!(csr.mat_vec(&x).unwrap().data(), &[2.0, 3.0]);
//! ```

use std::borrow::Cow;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tenalg_core::error::ensure_same_shape;
use tenalg_core::parallel::run_partitioned;
use tenalg_core::{DenseTensor, Dispatcher, Execution, Ring, Semiring, Shape, TensorError};

use crate::coo_matrix::CooMatrix;
use crate::error::{CsrError, Result};
use crate::merge;

/// CSR (Compressed Sparse Row) matrix
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CsrMatrix<T> {
    /// Row pointers: row_ptr[i] = start of row i in col_indices/values
    row_ptr: Vec<usize>,

    /// Column index of each stored entry
    col_indices: Vec<usize>,

    values: Vec<T>,

    shape: Shape,
}

/// Fail with a shape mismatch unless `dense` is a matrix with `rows` rows.
fn ensure_rows<T>(op: &str, lhs: &Shape, dense: &DenseTensor<T>, rows: usize) -> Result<usize> {
    match dense.dims() {
        [r, c] if *r == rows => Ok(*c),
        _ => Err(TensorError::shape_mismatch(op, lhs.dims(), dense.dims()).into()),
    }
}

impl<T> CsrMatrix<T> {
    /// Create a new CSR matrix
    ///
    /// # Arguments
    ///
    /// * `row_ptr` - Row pointers (length nrows+1)
    /// * `col_indices` - Column index of each stored entry
    /// * `values` - Value of each stored entry
    /// * `shape` - (nrows, ncols)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - row_ptr length is incorrect, does not start at 0 or is decreasing
    /// - row_ptr does not end at the entry count
    /// - col_indices and values have different lengths
    /// - any column index is out of bounds
    pub fn new(
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> std::result::Result<Self, CsrError> {
        let (nrows, ncols) = shape;

        if nrows.checked_add(1) != Some(row_ptr.len()) {
            return Err(CsrError::InvalidRowPtr {
                len: row_ptr.len(),
                nrows,
                expected: nrows.saturating_add(1),
            });
        }

        if col_indices.len() != values.len() {
            return Err(CsrError::LengthMismatch {
                col_indices: col_indices.len(),
                values: values.len(),
            });
        }

        if row_ptr[0] != 0 {
            return Err(CsrError::RowPtrStart { first: row_ptr[0] });
        }

        for (idx, w) in row_ptr.windows(2).enumerate() {
            if w[0] > w[1] {
                return Err(CsrError::RowPtrNotSorted {
                    idx,
                    curr: w[0],
                    next: w[1],
                });
            }
        }

        let nnz = col_indices.len();
        if row_ptr[nrows] != nnz {
            return Err(CsrError::RowPtrEnd {
                last: row_ptr[nrows],
                nnz,
            });
        }

        if let Some(&col_idx) = col_indices.iter().find(|&&c| c >= ncols) {
            return Err(CsrError::ColIndexOutOfBounds { col_idx, ncols });
        }

        Ok(Self {
            row_ptr,
            col_indices,
            values,
            shape: Shape::matrix(nrows, ncols),
        })
    }

    /// Matrix with no stored entries.
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            row_ptr: vec![0; shape.0 + 1],
            col_indices: Vec::new(),
            values: Vec::new(),
            shape: Shape::matrix(shape.0, shape.1),
        }
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn nrows(&self) -> usize {
        self.shape.dims()[0]
    }

    pub fn ncols(&self) -> usize {
        self.shape.dims()[1]
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn density(&self) -> f64 {
        let total = self.shape.total_entries_f64();
        if total == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / total
        }
    }

    /// Get a row as (col_indices, values) slices
    pub fn row(&self, i: usize) -> Option<(&[usize], &[T])> {
        if i >= self.nrows() {
            return None;
        }
        let range = self.row_range(i);
        Some((&self.col_indices[range.clone()], &self.values[range]))
    }

    #[inline]
    fn row_range(&self, i: usize) -> Range<usize> {
        self.row_ptr[i]..self.row_ptr[i + 1]
    }

    /// Same sparsity pattern with values `f(row, col, value)`.
    pub(crate) fn map_entries<U, F>(&self, mut f: F) -> CsrMatrix<U>
    where
        F: FnMut(usize, usize, &T) -> U,
    {
        let mut values = Vec::with_capacity(self.nnz());
        for row in 0..self.nrows() {
            for idx in self.row_range(row) {
                values.push(f(row, self.col_indices[idx], &self.values[idx]));
            }
        }
        CsrMatrix {
            row_ptr: self.row_ptr.clone(),
            col_indices: self.col_indices.clone(),
            values,
            shape: self.shape.clone(),
        }
    }

    /// Visit `(row, col, value)` for every stored entry, rows in order.
    pub fn for_each_entry<F>(&self, mut f: F)
    where
        F: FnMut(usize, usize, &T),
    {
        for row in 0..self.nrows() {
            for idx in self.row_range(row) {
                f(row, self.col_indices[idx], &self.values[idx]);
            }
        }
    }

    /// Whether column indices are strictly increasing within every row.
    pub fn has_sorted_rows(&self) -> bool {
        (0..self.nrows()).all(|i| merge::is_canonical(&self.col_indices[self.row_range(i)]))
    }
}

impl<T: Semiring> CsrMatrix<T> {
    /// Convert from COO format; duplicates are summed and rows sorted.
    pub fn from_coo(coo: &CooMatrix<T>) -> Self {
        let coo = if coo.is_canonical() {
            Cow::Borrowed(coo)
        } else {
            Cow::Owned(coo.coalesce())
        };
        let nrows = coo.nrows();

        let mut row_ptr = vec![0; nrows + 1];
        for &row in coo.row_indices() {
            row_ptr[row + 1] += 1;
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Self {
            row_ptr,
            col_indices: coo.col_indices().to_vec(),
            values: coo.values().to_vec(),
            shape: coo.shape().clone(),
        }
    }

    /// Convert to COO format, rows in order.
    pub fn to_coo(&self) -> CooMatrix<T> {
        let mut row_indices = Vec::with_capacity(self.nnz());
        for row in 0..self.nrows() {
            row_indices.extend(std::iter::repeat(row).take(self.row_range(row).len()));
        }
        CooMatrix::from_parts(
            self.shape.clone(),
            row_indices,
            self.col_indices.clone(),
            self.values.clone(),
        )
    }

    /// Sparse copy of the non-zero entries of a dense matrix.
    ///
    /// # Errors
    ///
    /// [`CsrError::InvalidShape`] unless `dense` has rank 2.
    pub fn from_dense(dense: &DenseTensor<T>) -> Result<Self> {
        let (nrows, ncols) = match dense.dims() {
            [r, c] => (*r, *c),
            _ => {
                return Err(CsrError::InvalidShape(format!(
                    "expected a matrix, got shape {}",
                    dense.shape()
                ))
                .into())
            }
        };

        let mut row_ptr = Vec::with_capacity(nrows + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for row in dense.data().chunks(ncols.max(1)).take(nrows) {
            for (col, value) in row.iter().enumerate() {
                if !value.is_zero() {
                    col_indices.push(col);
                    values.push(value.clone());
                }
            }
            row_ptr.push(values.len());
        }
        // ncols == 0 yields no chunks
        row_ptr.resize(nrows + 1, values.len());

        Ok(Self {
            row_ptr,
            col_indices,
            values,
            shape: Shape::matrix(nrows, ncols),
        })
    }

    /// Convert to dense matrix; duplicates are summed.
    pub fn to_dense(&self) -> Result<DenseTensor<T>> {
        let mut dense = DenseTensor::try_zeros(&self.shape)?;
        let ncols = self.ncols();
        let data: &mut [T] = dense.data_mut();
        for row in 0..self.nrows() {
            for idx in self.row_range(row) {
                let slot = &mut data[row * ncols + self.col_indices[idx]];
                *slot = slot.add(&self.values[idx]);
            }
        }
        Ok(dense)
    }

    /// Value at `(row, col)`, zero when nothing is stored there.
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        if row >= self.nrows() || col >= self.ncols() {
            return Err(TensorError::index_out_of_bounds(&[row, col], self.dims()).into());
        }
        let range = self.row_range(row);
        let cols = &self.col_indices[range.clone()];
        let vals = &self.values[range];
        if merge::is_canonical(cols) {
            return Ok(match merge::search(cols, &col) {
                Ok(pos) => vals[pos].clone(),
                Err(_) => T::zero(),
            });
        }
        Ok(cols
            .iter()
            .zip(vals)
            .filter(|(&c, _)| c == col)
            .fold(T::zero(), |acc, (_, v)| acc.add(v)))
    }

    /// Copy with every row sorted by column and duplicates summed.
    pub fn sort_rows(&self) -> Self {
        let mut row_ptr = Vec::with_capacity(self.nrows() + 1);
        let mut col_indices = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for i in 0..self.nrows() {
            let range = self.row_range(i);
            let (cols, vals) = merge::coalesce(
                self.col_indices[range.clone()].to_vec(),
                self.values[range].to_vec(),
                |a, b| a.add(b),
            );
            col_indices.extend(cols);
            values.extend(vals);
            row_ptr.push(values.len());
        }
        Self {
            row_ptr,
            col_indices,
            values,
            shape: self.shape.clone(),
        }
    }

    fn canonical(&self) -> Cow<'_, Self> {
        if self.has_sorted_rows() {
            Cow::Borrowed(self)
        } else {
            tracing::debug!(shape = %self.shape, nnz = self.nnz(), "sorting rows of CSR operand");
            Cow::Owned(self.sort_rows())
        }
    }

    /// Row-by-row merge of two equally shaped matrices.
    fn merge_rows<F>(&self, other: &Self, op: &str, mut merge_row: F) -> Result<Self>
    where
        F: FnMut((&[usize], &[T]), (&[usize], &[T])) -> (Vec<usize>, Vec<T>),
    {
        ensure_same_shape(op, self.dims(), other.dims())?;
        let (a, b) = (self.canonical(), other.canonical());

        let mut row_ptr = Vec::with_capacity(self.nrows() + 1);
        let mut col_indices = Vec::with_capacity(a.nnz().max(b.nnz()));
        let mut values = Vec::with_capacity(a.nnz().max(b.nnz()));
        row_ptr.push(0);
        for i in 0..self.nrows() {
            let (ra, rb) = (a.row_range(i), b.row_range(i));
            let (cols, vals) = merge_row(
                (&a.col_indices[ra.clone()], &a.values[ra]),
                (&b.col_indices[rb.clone()], &b.values[rb]),
            );
            col_indices.extend(cols);
            values.extend(vals);
            row_ptr.push(values.len());
        }
        Ok(Self {
            row_ptr,
            col_indices,
            values,
            shape: self.shape.clone(),
        })
    }

    /// Combine with `other` entry by entry as `op(a, unary(b))`.
    ///
    /// Entries stored only in `self` are copied, entries stored only in
    /// `other` become `unary(b)`. `op` must satisfy `op(a, 0) == a` and
    /// `op(0, b) == b`; a non-commutative operation is expressed through
    /// `unary`, e.g. subtraction as `add` with the additive inverse.
    pub fn apply_bin_op<F, U>(&self, other: &Self, op: F, unary: U) -> Result<Self>
    where
        F: Fn(&T, &T) -> T,
        U: Fn(&T) -> T,
    {
        self.merge_rows(other, "apply_bin_op", |a, b| {
            merge::merge_union(a, b, |x, y| op(x, &unary(y)), T::clone, &unary)
        })
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.apply_bin_op(other, |a, b| a.add(b), T::clone)
    }

    /// Elementwise product over coordinates stored in both operands.
    pub fn elem_mult(&self, other: &Self) -> Result<Self> {
        self.merge_rows(other, "elem_mult", |a, b| {
            merge::merge_intersection(a, b, |x, y| x.mult(y))
        })
    }

    pub fn mult_scalar(&self, scalar: &T) -> Self {
        self.map_values(|v| v.mult(scalar))
    }

    fn map_values<F>(&self, f: F) -> Self
    where
        F: FnMut(&T) -> T,
    {
        Self {
            row_ptr: self.row_ptr.clone(),
            col_indices: self.col_indices.clone(),
            values: self.values.iter().map(f).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Counting-sort transpose mapping each value through `f`.
    fn transpose_map<F>(&self, f: F) -> Self
    where
        F: Fn(&T) -> T,
    {
        let (m, n) = (self.nrows(), self.ncols());
        let nnz = self.nnz();

        let mut row_ptr = vec![0; n + 1];
        for &col in &self.col_indices {
            row_ptr[col + 1] += 1;
        }
        for i in 0..n {
            row_ptr[i + 1] += row_ptr[i];
        }

        let mut next = row_ptr[..n].to_vec();
        let mut col_indices = vec![0; nnz];
        let mut values = vec![T::zero(); nnz];
        for row in 0..m {
            for idx in self.row_range(row) {
                let col = self.col_indices[idx];
                let pos = next[col];
                col_indices[pos] = row;
                values[pos] = f(&self.values[idx]);
                next[col] += 1;
            }
        }

        Self {
            row_ptr,
            col_indices,
            values,
            shape: Shape::matrix(n, m),
        }
    }

    /// Transpose; rows of the result are sorted by column.
    pub fn transpose(&self) -> Self {
        self.transpose_map(T::clone)
    }

    fn accumulate_rows(&self, rows: Range<usize>, rhs: &[T], p: usize, chunk: &mut [T]) {
        for (local, row) in rows.enumerate() {
            let out_row = &mut chunk[local * p..(local + 1) * p];
            for idx in self.row_range(row) {
                let k = self.col_indices[idx];
                let v = &self.values[idx];
                for (slot, w) in out_row.iter_mut().zip(&rhs[k * p..(k + 1) * p]) {
                    *slot = slot.add(&v.mult(w));
                }
            }
        }
    }

    /// Sparse × dense matrix product.
    pub fn mat_mul_dense(&self, dense: &DenseTensor<T>) -> Result<DenseTensor<T>> {
        self.mat_mul_dense_with(dense, Dispatcher::global())
    }

    /// Sparse × dense matrix product, row-partitioned when the dispatcher
    /// selects concurrent execution.
    pub fn mat_mul_dense_with(
        &self,
        dense: &DenseTensor<T>,
        dispatcher: &Dispatcher,
    ) -> Result<DenseTensor<T>> {
        let p = ensure_rows("mat_mul_dense", &self.shape, dense, self.ncols())?;
        let out_shape = Shape::matrix(self.nrows(), p);
        let mut out = DenseTensor::try_zeros(&out_shape)?;
        if out.is_empty() {
            return Ok(out);
        }
        let rhs = dense.data();
        let execution = dispatcher.sparse_rows(&self.shape, &out_shape);
        match execution {
            Execution::Sequential => {
                self.accumulate_rows(0..self.nrows(), rhs, p, out.data_mut())
            }
            Execution::Concurrent => run_partitioned(out.data_mut(), p, |rows, chunk| {
                self.accumulate_rows(rows, rhs, p, chunk)
            }),
        }
        Ok(out)
    }

    fn accumulate_rows_transposed(&self, rows: Range<usize>, dense: &[T], p: usize, chunk: &mut [T]) {
        let n = self.ncols();
        for (local, row) in rows.enumerate() {
            let out_row = &mut chunk[local * p..(local + 1) * p];
            for idx in self.row_range(row) {
                let k = self.col_indices[idx];
                let v = &self.values[idx];
                for (j, slot) in out_row.iter_mut().enumerate() {
                    *slot = slot.add(&v.mult(&dense[j * n + k]));
                }
            }
        }
    }

    /// `self × denseᵀ` for a dense `p × ncols` operand, without building the
    /// transpose.
    ///
    /// Strided reads of `dense` trade locality for the saved copy; the result
    /// equals `mat_mul_dense` on the explicit transpose bit for bit.
    pub fn mat_mul_dense_transposed(&self, dense: &DenseTensor<T>) -> Result<DenseTensor<T>> {
        self.mat_mul_dense_transposed_with(dense, Dispatcher::global())
    }

    pub fn mat_mul_dense_transposed_with(
        &self,
        dense: &DenseTensor<T>,
        dispatcher: &Dispatcher,
    ) -> Result<DenseTensor<T>> {
        let (p, n) = match dense.dims() {
            [p, n] if *n == self.ncols() => (*p, *n),
            _ => {
                return Err(TensorError::shape_mismatch(
                    "mat_mul_dense_transposed",
                    self.dims(),
                    dense.dims(),
                )
                .into())
            }
        };
        let out_shape = Shape::matrix(self.nrows(), p);
        let mut out = DenseTensor::try_zeros(&out_shape)?;
        if out.is_empty() || n == 0 {
            return Ok(out);
        }
        let rhs = dense.data();
        match dispatcher.sparse_rows(&self.shape, &out_shape) {
            Execution::Sequential => {
                self.accumulate_rows_transposed(0..self.nrows(), rhs, p, out.data_mut())
            }
            Execution::Concurrent => run_partitioned(out.data_mut(), p, |rows, chunk| {
                self.accumulate_rows_transposed(rows, rhs, p, chunk)
            }),
        }
        Ok(out)
    }

    fn accumulate_left(&self, rows: Range<usize>, left: &[T], chunk: &mut [T]) {
        let (m, n) = (self.nrows(), self.ncols());
        for (local, i) in rows.enumerate() {
            let out_row = &mut chunk[local * n..(local + 1) * n];
            for (j, a) in left[i * m..(i + 1) * m].iter().enumerate() {
                for idx in self.row_range(j) {
                    let slot = &mut out_row[self.col_indices[idx]];
                    *slot = slot.add(&a.mult(&self.values[idx]));
                }
            }
        }
    }

    /// Dense × sparse matrix product `left × self`.
    pub fn dense_mat_mul(&self, left: &DenseTensor<T>) -> Result<DenseTensor<T>> {
        self.dense_mat_mul_with(left, Dispatcher::global())
    }

    pub fn dense_mat_mul_with(
        &self,
        left: &DenseTensor<T>,
        dispatcher: &Dispatcher,
    ) -> Result<DenseTensor<T>> {
        let q = match left.dims() {
            [q, k] if *k == self.nrows() => *q,
            _ => {
                return Err(
                    TensorError::shape_mismatch("dense_mat_mul", left.dims(), self.dims()).into(),
                )
            }
        };
        let out_shape = Shape::matrix(q, self.ncols());
        let mut out = DenseTensor::try_zeros(&out_shape)?;
        if out.is_empty() {
            return Ok(out);
        }
        let lhs = left.data();
        match dispatcher.sparse_rows(&self.shape, &out_shape) {
            Execution::Sequential => self.accumulate_left(0..q, lhs, out.data_mut()),
            Execution::Concurrent => run_partitioned(out.data_mut(), self.ncols(), |rows, chunk| {
                self.accumulate_left(rows, lhs, chunk)
            }),
        }
        Ok(out)
    }

    fn row_dot(&self, rows: Range<usize>, x: &[T], chunk: &mut [T]) {
        for (slot, row) in chunk.iter_mut().zip(rows) {
            *slot = self
                .row_range(row)
                .fold(T::zero(), |acc, idx| {
                    acc.add(&self.values[idx].mult(&x[self.col_indices[idx]]))
                });
        }
    }

    /// Sparse matrix × dense vector.
    pub fn mat_vec(&self, vector: &DenseTensor<T>) -> Result<DenseTensor<T>> {
        self.mat_vec_with(vector, Dispatcher::global())
    }

    pub fn mat_vec_with(
        &self,
        vector: &DenseTensor<T>,
        dispatcher: &Dispatcher,
    ) -> Result<DenseTensor<T>> {
        if vector.rank() != 1 || vector.len() != self.ncols() {
            return Err(TensorError::shape_mismatch("mat_vec", self.dims(), vector.dims()).into());
        }
        let out_shape = Shape::new(&[self.nrows()]);
        let mut out = vec![T::zero(); self.nrows()];
        let x = vector.data();
        match dispatcher.sparse_rows(&self.shape, &out_shape) {
            Execution::Sequential => self.row_dot(0..self.nrows(), x, &mut out),
            Execution::Concurrent if !out.is_empty() => {
                run_partitioned(&mut out, 1, |rows, chunk| self.row_dot(rows, x, chunk))
            }
            Execution::Concurrent => {}
        }
        Ok(DenseTensor::vector(out))
    }
}

impl<T: Ring> CsrMatrix<T> {
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.apply_bin_op(other, |a, b| a.add(b), T::add_inv)
    }

    /// Conjugate transpose.
    pub fn herm_transpose(&self) -> Self {
        self.transpose_map(T::conj)
    }
}
