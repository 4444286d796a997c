//! COO sparse matrices with parallel row/column arrays
//!
//! [`CooMatrix`] is the rank-2 specialisation of [`CooTensor`]: coordinates
//! are stored as two parallel `Vec<usize>` instead of one multi-index per
//! entry. Entries are ordered by `(row, col)`; the canonical-form rules of
//! the tensor type apply unchanged.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::DenseTensor;
//! use tenalg_sparse::CooMatrix;
//!
//! let a = CooMatrix::new(2, 3, vec![0, 1], vec![2, 0], vec![1.0, 2.0]).unwrap();
//! let x = DenseTensor::vector(vec![1.0, 1.0, 1.0]);
//! assert_eq!(a.mat_vec(&x).unwrap().data(), &[1.0, 2.0]);
//!
//! let csr = a.to_csr();
//! assert_eq!(csr.row_ptr(), &[0, 1, 2]);
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tenalg_core::algebra::arg_extreme;
use tenalg_core::error::ensure_same_shape;
use tenalg_core::{DenseTensor, Ring, Semiring, Shape, TensorError};

use crate::coo::CooTensor;
use crate::csr::CsrMatrix;
use crate::error::{CooError, Result};
use crate::merge;

/// Sparse matrix in coordinate format
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CooMatrix<T> {
    shape: Shape,
    row_indices: Vec<usize>,
    col_indices: Vec<usize>,
    values: Vec<T>,
}

impl<T> CooMatrix<T> {
    /// Create a COO matrix from parallel row, column and value arrays.
    ///
    /// # Errors
    ///
    /// - [`CooError::LengthMismatch`] if the three arrays differ in length
    /// - [`CooError::IndexOutOfBounds`] if a coordinate lies outside `nrows × ncols`
    pub fn new(
        nrows: usize,
        ncols: usize,
        row_indices: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> std::result::Result<Self, CooError> {
        for len in [row_indices.len(), col_indices.len()] {
            if len != values.len() {
                return Err(CooError::LengthMismatch {
                    indices: len,
                    values: values.len(),
                });
            }
        }
        for (&r, &c) in row_indices.iter().zip(&col_indices) {
            if r >= nrows || c >= ncols {
                return Err(CooError::IndexOutOfBounds {
                    index: vec![r, c],
                    shape: vec![nrows, ncols],
                });
            }
        }
        Ok(Self {
            shape: Shape::matrix(nrows, ncols),
            row_indices,
            col_indices,
            values,
        })
    }

    /// Matrix with no stored entries.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            shape: Shape::matrix(nrows, ncols),
            row_indices: Vec::new(),
            col_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Assemble from parts already known to be valid.
    pub(crate) fn from_parts(
        shape: Shape,
        row_indices: Vec<usize>,
        col_indices: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        debug_assert_eq!(row_indices.len(), values.len());
        debug_assert_eq!(col_indices.len(), values.len());
        Self {
            shape,
            row_indices,
            col_indices,
            values,
        }
    }

    fn from_keyed(shape: Shape, keys: Vec<(usize, usize)>, values: Vec<T>) -> Self {
        let (row_indices, col_indices) = keys.into_iter().unzip();
        Self {
            shape,
            row_indices,
            col_indices,
            values,
        }
    }

    fn keys(&self) -> Vec<(usize, usize)> {
        self.row_indices
            .iter()
            .copied()
            .zip(self.col_indices.iter().copied())
            .collect()
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

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Iterate over `(row, col, &value)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        self.row_indices
            .iter()
            .zip(&self.col_indices)
            .zip(&self.values)
            .map(|((&r, &c), v)| (r, c, v))
    }

    pub fn density(&self) -> f64 {
        let total = self.shape.total_entries_f64();
        if total == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / total
        }
    }

    /// Whether `(row, col)` pairs are strictly increasing.
    pub fn is_canonical(&self) -> bool {
        self.row_indices
            .windows(2)
            .zip(self.col_indices.windows(2))
            .all(|(r, c)| (r[0], c[0]) < (r[1], c[1]))
    }

    /// Binary search for `(row, col)` in a sorted matrix.
    pub fn search(&self, row: usize, col: usize) -> std::result::Result<usize, usize> {
        let target = (row, col);
        let (mut lo, mut hi) = (0, self.nnz());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match (self.row_indices[mid], self.col_indices[mid]).cmp(&target) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    /// Sort entries by `(row, col)`; duplicates are kept.
    pub fn sort_indices(&mut self) {
        if self.is_canonical() {
            return;
        }
        let values = std::mem::take(&mut self.values);
        let (keys, values) = merge::sort_by_key(self.keys(), values);
        let (rows, cols) = keys.into_iter().unzip();
        self.row_indices = rows;
        self.col_indices = cols;
        self.values = values;
    }

    /// Rank-2 [`CooTensor`] with the same entries.
    pub fn to_tensor(&self) -> CooTensor<T>
    where
        T: Clone,
    {
        let indices = self
            .row_indices
            .iter()
            .zip(&self.col_indices)
            .map(|(&r, &c)| vec![r, c])
            .collect();
        CooTensor::from_parts(self.shape.clone(), indices, self.values.clone())
    }

    /// Matrix view of a rank-2 [`CooTensor`].
    ///
    /// # Errors
    ///
    /// [`CooError::InvalidShape`] unless the tensor has rank 2.
    pub fn from_tensor(tensor: &CooTensor<T>) -> std::result::Result<Self, CooError>
    where
        T: Clone,
    {
        if tensor.rank() != 2 {
            return Err(CooError::InvalidShape(format!(
                "expected a rank-2 tensor, got shape {}",
                tensor.shape()
            )));
        }
        let (row_indices, col_indices) = tensor.indices().iter().map(|i| (i[0], i[1])).unzip();
        Ok(Self {
            shape: tensor.shape().clone(),
            row_indices,
            col_indices,
            values: tensor.values().to_vec(),
        })
    }

    /// Swap rows and columns; entry order is kept.
    pub fn transpose(&self) -> Self
    where
        T: Clone,
    {
        Self {
            shape: Shape::matrix(self.ncols(), self.nrows()),
            row_indices: self.col_indices.clone(),
            col_indices: self.row_indices.clone(),
            values: self.values.clone(),
        }
    }
}

impl<T: Semiring> CooMatrix<T> {
    /// Canonical copy with duplicates summed.
    pub fn coalesce(&self) -> Self {
        let (keys, values) = merge::coalesce(self.keys(), self.values.clone(), |a, b| a.add(b));
        Self::from_keyed(self.shape.clone(), keys, values)
    }

    fn canonical(&self) -> Cow<'_, Self> {
        if self.is_canonical() {
            Cow::Borrowed(self)
        } else {
            tracing::debug!(shape = %self.shape, nnz = self.nnz(), "coalescing non-canonical COO matrix");
            Cow::Owned(self.coalesce())
        }
    }

    /// Sparse copy of the non-zero entries of a dense matrix; canonical.
    pub fn from_dense(dense: &DenseTensor<T>) -> Result<Self> {
        let (nrows, ncols) = dense.matrix_dims()?;
        let mut out = Self::zeros(nrows, ncols);
        for (flat, value) in dense.data().iter().enumerate() {
            if !value.is_zero() {
                out.row_indices.push(flat / ncols);
                out.col_indices.push(flat % ncols);
                out.values.push(value.clone());
            }
        }
        Ok(out)
    }

    /// Dense copy; duplicates are summed.
    pub fn to_dense(&self) -> Result<DenseTensor<T>> {
        let mut dense = DenseTensor::try_zeros(&self.shape)?;
        let ncols = self.ncols();
        let data: &mut [T] = dense.data_mut();
        for (r, c, v) in self.iter() {
            let slot = &mut data[r * ncols + c];
            *slot = slot.add(v);
        }
        Ok(dense)
    }

    /// Compressed-row copy.
    pub fn to_csr(&self) -> CsrMatrix<T> {
        CsrMatrix::from_coo(self)
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.nrows() || col >= self.ncols() {
            return Err(TensorError::index_out_of_bounds(&[row, col], self.dims()).into());
        }
        Ok(())
    }

    /// Value at `(row, col)`, zero when nothing is stored there.
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.check_bounds(row, col)?;
        if self.is_canonical() {
            return Ok(match self.search(row, col) {
                Ok(pos) => self.values[pos].clone(),
                Err(_) => T::zero(),
            });
        }
        Ok(self
            .iter()
            .filter(|&(r, c, _)| r == row && c == col)
            .fold(T::zero(), |acc, (_, _, v)| acc.add(v)))
    }

    /// Store `value` at `(row, col)`; the matrix is canonical afterwards.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_bounds(row, col)?;
        if !self.is_canonical() {
            *self = self.coalesce();
        }
        match self.search(row, col) {
            Ok(pos) => self.values[pos] = value,
            Err(pos) => {
                self.row_indices.insert(pos, row);
                self.col_indices.insert(pos, col);
                self.values.insert(pos, value);
            }
        }
        Ok(())
    }

    fn union_with<FB, FO>(&self, other: &Self, op: &str, both: FB, only_b: FO) -> Result<Self>
    where
        FB: FnMut(&T, &T) -> T,
        FO: FnMut(&T) -> T,
    {
        ensure_same_shape(op, self.dims(), other.dims())?;
        let (a, b) = (self.canonical(), other.canonical());
        let (keys, values) = merge::merge_union(
            (&a.keys()[..], &a.values[..]),
            (&b.keys()[..], &b.values[..]),
            both,
            T::clone,
            only_b,
        );
        Ok(Self::from_keyed(self.shape.clone(), keys, values))
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.union_with(other, "add", |x, y| x.add(y), T::clone)
    }

    /// Elementwise product over coordinates stored in both operands.
    pub fn elem_mult(&self, other: &Self) -> Result<Self> {
        ensure_same_shape("elem_mult", self.dims(), other.dims())?;
        let (a, b) = (self.canonical(), other.canonical());
        let (keys, values) = merge::merge_intersection(
            (&a.keys()[..], &a.values[..]),
            (&b.keys()[..], &b.values[..]),
            |x, y| x.mult(y),
        );
        Ok(Self::from_keyed(self.shape.clone(), keys, values))
    }

    pub fn mult_scalar(&self, scalar: &T) -> Self {
        Self {
            shape: self.shape.clone(),
            row_indices: self.row_indices.clone(),
            col_indices: self.col_indices.clone(),
            values: self.values.iter().map(|v| v.mult(scalar)).collect(),
        }
    }

    /// Matrix-vector product with a dense vector of length `ncols`.
    pub fn mat_vec(&self, vector: &DenseTensor<T>) -> Result<DenseTensor<T>> {
        if vector.rank() != 1 || vector.len() != self.ncols() {
            return Err(TensorError::shape_mismatch("mat_vec", self.dims(), vector.dims()).into());
        }
        let x = vector.data();
        let mut out = vec![T::zero(); self.nrows()];
        for (r, c, v) in self.iter() {
            out[r] = out[r].add(&v.mult(&x[c]));
        }
        Ok(DenseTensor::vector(out))
    }

    pub fn min(&self) -> Option<&T> {
        arg_extreme(&self.values, Ordering::Less).map(|pos| &self.values[pos])
    }

    pub fn max(&self) -> Option<&T> {
        arg_extreme(&self.values, Ordering::Greater).map(|pos| &self.values[pos])
    }

    /// `(row, col)` of the smallest stored value.
    pub fn argmin(&self) -> Option<(usize, usize)> {
        arg_extreme(&self.values, Ordering::Less)
            .map(|pos| (self.row_indices[pos], self.col_indices[pos]))
    }

    /// `(row, col)` of the largest stored value.
    pub fn argmax(&self) -> Option<(usize, usize)> {
        arg_extreme(&self.values, Ordering::Greater)
            .map(|pos| (self.row_indices[pos], self.col_indices[pos]))
    }
}

impl<T: Ring> CooMatrix<T> {
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.union_with(other, "sub", |x, y| x.sub(y), T::add_inv)
    }

    /// Conjugate transpose.
    pub fn herm_transpose(&self) -> Self {
        Self {
            shape: Shape::matrix(self.ncols(), self.nrows()),
            row_indices: self.col_indices.clone(),
            col_indices: self.row_indices.clone(),
            values: self.values.iter().map(T::conj).collect(),
        }
    }
}
