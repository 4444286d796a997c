//! COO (Coordinate) sparse tensor format
//!
//! The Coordinate format stores an N-dimensional sparse tensor as a list of
//! multi-indices with a parallel list of values.
//!
//! # Canonical form
//!
//! A tensor is *canonical* when its indices are strictly increasing in
//! lexicographic order (first differing axis decides), i.e. sorted and free
//! of duplicates. Construction accepts any order; [`CooTensor::sort_indices`]
//! and [`CooTensor::coalesce`] normalise. Binary elementwise kernels check
//! canonicity in O(nnz) and coalesce operands that are not canonical, so
//! unsorted input never produces wrong results, only extra work.
//!
//! Structural operations that move coordinates ([`CooTensor::permute`] and
//! friends) keep the entry order and therefore usually return a
//! non-canonical tensor.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::Shape;
//! use tenalg_sparse::CooTensor;
//!
//! let mut coo = CooTensor::new(Shape::new(&[2, 3]), vec![vec![1, 2], vec![0, 1]], vec![3.0, 5.0]).unwrap();
//! assert!(!coo.is_canonical());
//! coo.sort_indices();
//! assert_eq!(coo.indices(), &[vec![0, 1], vec![1, 2]]);
//!
//! let dense = coo.to_dense().unwrap();
//! assert_eq!(dense.data(), &[0.0, 5.0, 0.0, 0.0, 0.0, 3.0]);
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tenalg_core::algebra::arg_extreme;
use tenalg_core::dense::products::{plan_contraction, trace_shape};
use tenalg_core::error::{ensure_axis, ensure_same_shape};
use tenalg_core::shape::ensure_permutation;
use tenalg_core::{DenseTensor, Dispatcher, Ring, Semiring, Shape};

use crate::error::{CooError, Result};
use crate::merge;

/// Validate one multi-index against a shape.
pub(crate) fn check_coo_index(shape: &Shape, index: &[usize]) -> std::result::Result<(), CooError> {
    if index.len() != shape.rank() {
        return Err(CooError::RankMismatch {
            index_rank: index.len(),
            shape_rank: shape.rank(),
        });
    }
    if !shape.contains(index) {
        return Err(CooError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: shape.dims().to_vec(),
        });
    }
    Ok(())
}

/// Row-major flat position of `index` restricted to `axes`, in that order.
#[inline]
pub(crate) fn flat_over(index: &[usize], axes: &[usize], dims: &[usize]) -> usize {
    axes.iter().fold(0, |acc, &axis| acc * dims[axis] + index[axis])
}

/// COO (Coordinate) sparse tensor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CooTensor<T> {
    shape: Shape,
    /// One multi-index per stored entry
    indices: Vec<Vec<usize>>,
    values: Vec<T>,
}

impl<T> CooTensor<T> {
    /// Create a COO tensor.
    ///
    /// # Errors
    ///
    /// - [`CooError::LengthMismatch`] if `indices` and `values` differ in length
    /// - [`CooError::RankMismatch`] if an index does not have one coordinate per axis
    /// - [`CooError::IndexOutOfBounds`] if a coordinate exceeds its axis
    pub fn new(
        shape: Shape,
        indices: Vec<Vec<usize>>,
        values: Vec<T>,
    ) -> std::result::Result<Self, CooError> {
        if indices.len() != values.len() {
            return Err(CooError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        for index in &indices {
            check_coo_index(&shape, index)?;
        }
        Ok(Self {
            shape,
            indices,
            values,
        })
    }

    /// Tensor with no stored entries.
    pub fn zeros(shape: Shape) -> Self {
        Self {
            shape,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Assemble from parts already known to be valid.
    pub(crate) fn from_parts(shape: Shape, indices: Vec<Vec<usize>>, values: Vec<T>) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self {
            shape,
            indices,
            values,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to the stored values; coordinates stay fixed.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    pub fn into_parts(self) -> (Shape, Vec<Vec<usize>>, Vec<T>) {
        (self.shape, self.indices, self.values)
    }

    /// Fraction of entries that are stored (`nnz / total entries`).
    pub fn density(&self) -> f64 {
        let total = self.shape.total_entries_f64();
        if total == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / total
        }
    }

    /// Fraction of entries that are implicit zeros.
    pub fn sparsity(&self) -> f64 {
        1.0 - self.density()
    }

    /// Whether indices are strictly increasing (sorted, no duplicates).
    pub fn is_canonical(&self) -> bool {
        merge::is_canonical(&self.indices)
    }

    /// Lexicographic binary search over the indices.
    ///
    /// Requires sorted indices. Returns `Ok(position)` on a hit or
    /// `Err(insertion_point)` on a miss.
    pub fn search(&self, target: &[usize]) -> std::result::Result<usize, usize> {
        self.indices
            .binary_search_by(|entry| entry.as_slice().cmp(target))
    }

    /// Sort entries lexicographically by index; duplicates are kept.
    pub fn sort_indices(&mut self) {
        if self.is_canonical() {
            return;
        }
        let indices = std::mem::take(&mut self.indices);
        let values = std::mem::take(&mut self.values);
        let (indices, values) = merge::sort_by_key(indices, values);
        self.indices = indices;
        self.values = values;
    }
}

impl<T: Clone> CooTensor<T> {
    /// Canonical copy with duplicate entries combined by `aggregate`.
    pub fn coalesce_with<F>(&self, aggregate: F) -> Self
    where
        F: FnMut(&T, &T) -> T,
    {
        let (indices, values) =
            merge::coalesce(self.indices.clone(), self.values.clone(), aggregate);
        Self::from_parts(self.shape.clone(), indices, values)
    }

    /// Apply `f` to every stored value.
    pub fn map<U, F>(&self, f: F) -> CooTensor<U>
    where
        F: FnMut(&T) -> U,
    {
        CooTensor::from_parts(
            self.shape.clone(),
            self.indices.clone(),
            self.values.iter().map(f).collect(),
        )
    }

    fn permute_impl<F>(&self, perm: &[usize], f: F) -> Result<Self>
    where
        F: Fn(&T) -> T,
    {
        ensure_permutation(perm, self.rank())?;
        let shape = self.shape.permute_axes(perm)?;
        let indices = self
            .indices
            .iter()
            .map(|index| perm.iter().map(|&p| index[p]).collect())
            .collect();
        let values = self.values.iter().map(f).collect();
        Ok(Self::from_parts(shape, indices, values))
    }

    fn swap_perm(&self, axis1: usize, axis2: usize) -> Result<Vec<usize>> {
        ensure_axis(axis1, self.rank())?;
        ensure_axis(axis2, self.rank())?;
        let mut perm: Vec<usize> = (0..self.rank()).collect();
        perm.swap(axis1, axis2);
        Ok(perm)
    }

    /// Exchange the first and last axes. Tensors of rank < 2 are returned as is.
    pub fn transpose(&self) -> Self {
        if self.rank() < 2 {
            return self.clone();
        }
        let indices = self
            .indices
            .iter()
            .map(|index| {
                let mut index = index.clone();
                let last = index.len() - 1;
                index.swap(0, last);
                index
            })
            .collect();
        let mut dims = self.dims().to_vec();
        let last = dims.len() - 1;
        dims.swap(0, last);
        Self::from_parts(Shape::new(&dims), indices, self.values.clone())
    }

    /// Exchange two axes.
    pub fn transpose_axes(&self, axis1: usize, axis2: usize) -> Result<Self> {
        let perm = self.swap_perm(axis1, axis2)?;
        self.permute_impl(&perm, T::clone)
    }

    /// Reorder axes: result axis `k` is axis `axes[k]` of `self`.
    pub fn permute(&self, axes: &[usize]) -> Result<Self> {
        self.permute_impl(axes, T::clone)
    }

    /// Same entries under new dimensions with the same entry count.
    ///
    /// Row-major order is preserved, so a canonical tensor stays canonical.
    pub fn reshape(&self, dims: &[usize]) -> Result<Self> {
        let shape = self.shape.reshape(dims)?;
        let mut scratch = vec![0; shape.rank()];
        let indices = self
            .indices
            .iter()
            .map(|index| {
                shape.nd_index_into(self.shape.flat_index_unchecked(index), &mut scratch);
                scratch.clone()
            })
            .collect();
        Ok(Self::from_parts(shape, indices, self.values.clone()))
    }

    /// Rank-1 tensor over all entries.
    pub fn flatten(&self) -> Result<Self> {
        let total = self.shape.total_entries_exact()?;
        let indices = self
            .indices
            .iter()
            .map(|index| vec![self.shape.flat_index_unchecked(index)])
            .collect();
        Ok(Self::from_parts(
            Shape::new(&[total]),
            indices,
            self.values.clone(),
        ))
    }

    /// Same rank, every axis of length 1 except `axis`, which holds all entries.
    pub fn flatten_axis(&self, axis: usize) -> Result<Self> {
        ensure_axis(axis, self.rank())?;
        let total = self.shape.total_entries_exact()?;
        let mut dims = vec![1; self.rank()];
        dims[axis] = total;
        let indices = self
            .indices
            .iter()
            .map(|index| {
                let mut flat = vec![0; dims.len()];
                flat[axis] = self.shape.flat_index_unchecked(index);
                flat
            })
            .collect();
        Ok(Self::from_parts(Shape::new(&dims), indices, self.values.clone()))
    }
}

impl<T: Semiring> CooTensor<T> {
    /// Canonical copy with duplicate entries summed.
    pub fn coalesce(&self) -> Self {
        self.coalesce_with(|a, b| a.add(b))
    }

    /// Borrow `self` when canonical, otherwise a coalesced copy.
    pub(crate) fn canonical(&self) -> Cow<'_, Self> {
        if self.is_canonical() {
            Cow::Borrowed(self)
        } else {
            tracing::debug!(shape = %self.shape, nnz = self.nnz(), "coalescing non-canonical COO operand");
            Cow::Owned(self.coalesce())
        }
    }

    /// Copy without explicitly stored zeros.
    pub fn drop_zeros(&self) -> Self {
        let (indices, values) = self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| !v.is_zero())
            .map(|(i, v)| (i.clone(), v.clone()))
            .unzip();
        Self::from_parts(self.shape.clone(), indices, values)
    }

    /// Sparse copy of the non-zero entries of a dense tensor; canonical.
    pub fn from_dense(dense: &DenseTensor<T>) -> Self {
        let shape = dense.shape().clone();
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (flat, value) in dense.data().iter().enumerate() {
            if !value.is_zero() {
                let mut index = vec![0; shape.rank()];
                shape.nd_index_into(flat, &mut index);
                indices.push(index);
                values.push(value.clone());
            }
        }
        Self::from_parts(shape, indices, values)
    }

    /// Dense copy; duplicate entries are summed.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the dense buffer would exceed the maximum
    /// array size.
    pub fn to_dense(&self) -> Result<DenseTensor<T>> {
        let mut dense = DenseTensor::try_zeros(&self.shape)?;
        let data: &mut [T] = dense.data_mut();
        for (index, value) in self.indices.iter().zip(&self.values) {
            let flat = self.shape.flat_index_unchecked(index);
            data[flat] = data[flat].add(value);
        }
        Ok(dense)
    }

    /// Value at `index`, zero when nothing is stored there.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        self.shape.check_index(index)?;
        if self.is_canonical() {
            return Ok(match self.search(index) {
                Ok(pos) => self.values[pos].clone(),
                Err(_) => T::zero(),
            });
        }
        Ok(self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|(i, _)| i.as_slice() == index)
            .fold(T::zero(), |acc, (_, v)| acc.add(v)))
    }

    /// Store `value` at `index`, replacing any stored entry.
    ///
    /// A non-canonical tensor is coalesced first so the result is canonical.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        self.shape.check_index(index)?;
        if !self.is_canonical() {
            *self = self.coalesce();
        }
        match self.search(index) {
            Ok(pos) => self.values[pos] = value,
            Err(pos) => {
                self.indices.insert(pos, index.to_vec());
                self.values.insert(pos, value);
            }
        }
        Ok(())
    }

    /// Elementwise sum; the result is canonical.
    pub fn add(&self, other: &Self) -> Result<Self> {
        ensure_same_shape("add", self.dims(), other.dims())?;
        let (a, b) = (self.canonical(), other.canonical());
        let (indices, values) = merge::merge_union(
            (&a.indices[..], &a.values[..]),
            (&b.indices[..], &b.values[..]),
            |x, y| x.add(y),
            T::clone,
            T::clone,
        );
        Ok(Self::from_parts(self.shape.clone(), indices, values))
    }

    /// Elementwise product; only coordinates stored in both operands survive.
    pub fn elem_mult(&self, other: &Self) -> Result<Self> {
        ensure_same_shape("elem_mult", self.dims(), other.dims())?;
        let (a, b) = (self.canonical(), other.canonical());
        let (indices, values) = merge::merge_intersection(
            (&a.indices[..], &a.values[..]),
            (&b.indices[..], &b.values[..]),
            |x, y| x.mult(y),
        );
        Ok(Self::from_parts(self.shape.clone(), indices, values))
    }

    pub fn mult_scalar(&self, scalar: &T) -> Self {
        self.map(|v| v.mult(scalar))
    }

    pub fn mult_scalar_assign(&mut self, scalar: &T) {
        for v in &mut self.values {
            *v = v.mult(scalar);
        }
    }

    /// Smallest stored value under [`Semiring::compare`].
    pub fn min(&self) -> Option<&T> {
        arg_extreme(&self.values, Ordering::Less).map(|pos| &self.values[pos])
    }

    /// Largest stored value under [`Semiring::compare`].
    pub fn max(&self) -> Option<&T> {
        arg_extreme(&self.values, Ordering::Greater).map(|pos| &self.values[pos])
    }

    /// Index of the smallest stored value.
    pub fn argmin(&self) -> Option<&[usize]> {
        arg_extreme(&self.values, Ordering::Less).map(|pos| self.indices[pos].as_slice())
    }

    /// Index of the largest stored value.
    pub fn argmax(&self) -> Option<&[usize]> {
        arg_extreme(&self.values, Ordering::Greater).map(|pos| self.indices[pos].as_slice())
    }

    /// Generalised trace over `axis1` and `axis2`; the result is canonical.
    ///
    /// Only entries with equal coordinates on both axes contribute.
    pub fn tensor_tr(&self, axis1: usize, axis2: usize) -> Result<Self> {
        let (shape, _) = trace_shape(&self.shape, axis1, axis2)?;
        let mut sums: BTreeMap<Vec<usize>, T> = BTreeMap::new();
        for (index, value) in self.indices.iter().zip(&self.values) {
            if index[axis1] != index[axis2] {
                continue;
            }
            let rest: Vec<usize> = index
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != axis1 && k != axis2)
                .map(|(_, &i)| i)
                .collect();
            sums.entry(rest)
                .and_modify(|acc| *acc = acc.add(value))
                .or_insert_with(|| value.clone());
        }
        let (indices, values) = sums.into_iter().unzip();
        Ok(Self::from_parts(shape, indices, values))
    }

    /// Contract `axes_a` of `self` with `axes_b` of `other`.
    ///
    /// The result is dense: the free axes of `self` followed by the free axes
    /// of `other`.
    pub fn tensor_dot(
        &self,
        other: &Self,
        axes_a: &[usize],
        axes_b: &[usize],
    ) -> Result<DenseTensor<T>> {
        let plan = plan_contraction(&self.shape, &other.shape, axes_a, axes_b)?;
        let mut out = DenseTensor::try_zeros(&Shape::new(&plan.result_dims))?;
        let cols = plan.cols;

        let n_contracted = axes_b.len();
        let (b_contracted, b_free) = plan.perm_b.split_at(n_contracted);
        let mut by_inner: HashMap<usize, Vec<(usize, &T)>> = HashMap::new();
        for (index, value) in other.indices.iter().zip(&other.values) {
            let k = flat_over(index, b_contracted, other.dims());
            let col = flat_over(index, b_free, other.dims());
            by_inner.entry(k).or_default().push((col, value));
        }

        let (a_free, a_contracted) = plan.perm_a.split_at(self.rank() - axes_a.len());
        let data: &mut [T] = out.data_mut();
        for (index, value) in self.indices.iter().zip(&self.values) {
            let k = flat_over(index, a_contracted, self.dims());
            if let Some(matches) = by_inner.get(&k) {
                let row = flat_over(index, a_free, self.dims());
                for &(col, w) in matches {
                    let slot = &mut data[row * cols + col];
                    *slot = slot.add(&value.mult(w));
                }
            }
        }
        Ok(out)
    }

    /// Contract with a dense tensor; see [`CooTensor::tensor_dot`].
    pub fn tensor_dot_dense(
        &self,
        other: &DenseTensor<T>,
        axes_a: &[usize],
        axes_b: &[usize],
    ) -> Result<DenseTensor<T>> {
        self.tensor_dot_dense_with(other, axes_a, axes_b, Dispatcher::global())
    }

    pub fn tensor_dot_dense_with(
        &self,
        other: &DenseTensor<T>,
        axes_a: &[usize],
        axes_b: &[usize],
        dispatcher: &Dispatcher,
    ) -> Result<DenseTensor<T>> {
        let plan = plan_contraction(&self.shape, other.shape(), axes_a, axes_b)?;
        let mut out = DenseTensor::try_zeros(&Shape::new(&plan.result_dims))?;
        let cols = plan.cols;

        // inner × cols matrix with the contracted axes leading
        let rhs = other.permute_with(&plan.perm_b, dispatcher)?;
        let rhs = rhs.data();

        let (a_free, a_contracted) = plan.perm_a.split_at(self.rank() - axes_a.len());
        let data: &mut [T] = out.data_mut();
        for (index, value) in self.indices.iter().zip(&self.values) {
            let row = flat_over(index, a_free, self.dims());
            let k = flat_over(index, a_contracted, self.dims());
            let out_row = &mut data[row * cols..(row + 1) * cols];
            for (slot, w) in out_row.iter_mut().zip(&rhs[k * cols..(k + 1) * cols]) {
                *slot = slot.add(&value.mult(w));
            }
        }
        Ok(out)
    }
}

impl<T: Ring> CooTensor<T> {
    /// Elementwise difference; the result is canonical.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        ensure_same_shape("sub", self.dims(), other.dims())?;
        let (a, b) = (self.canonical(), other.canonical());
        let (indices, values) = merge::merge_union(
            (&a.indices[..], &a.values[..]),
            (&b.indices[..], &b.values[..]),
            |x, y| x.sub(y),
            T::clone,
            T::add_inv,
        );
        Ok(Self::from_parts(self.shape.clone(), indices, values))
    }

    pub fn neg(&self) -> Self {
        self.map(T::add_inv)
    }

    pub fn conj(&self) -> Self {
        self.map(T::conj)
    }

    /// Conjugate transpose over the first and last axes.
    pub fn herm_transpose(&self) -> Self {
        let mut out = self.transpose();
        for v in &mut out.values {
            *v = v.conj();
        }
        out
    }

    pub fn herm_transpose_axes(&self, axis1: usize, axis2: usize) -> Result<Self> {
        let perm = self.swap_perm(axis1, axis2)?;
        self.permute_impl(&perm, T::conj)
    }

    pub fn herm_permute(&self, axes: &[usize]) -> Result<Self> {
        self.permute_impl(axes, T::conj)
    }
}
