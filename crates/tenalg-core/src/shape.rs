//! N-dimensional shape descriptor
//!
//! A [`Shape`] stores dimension sizes together with their row-major strides
//! (last axis fastest), so that
//!
//! ```text
//! flat = Σ index[k] * strides[k]
//! ```
//!
//! Shapes are immutable: structural transforms (`swap_axes`, `permute_axes`,
//! `reshape`) return new values.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::Shape;
//!
//! let shape = Shape::new(&[2, 3, 4]);
//! assert_eq!(shape.strides(), &[12, 4, 1]);
//! assert_eq!(shape.flat_index(&[1, 2, 3]).unwrap(), 23);
//! assert_eq!(shape.nd_index(23).unwrap(), vec![1, 2, 3]);
//!
//! let swapped = shape.swap_axes(0, 2).unwrap();
//! assert_eq!(swapped.dims(), &[4, 3, 2]);
//! assert_eq!(swapped.to_string(), "(4, 3, 2)");
//! ```

use std::fmt;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ensure_axis, Result, TensorError};

/// Inline storage for dimensions and strides; most tensors have rank <= 6.
pub type DimVec = SmallVec<[usize; 6]>;

/// Immutable N-dimensional shape with row-major strides.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    dims: DimVec,
    strides: DimVec,
}

/// Row-major strides for `dims`.
///
/// Products saturate instead of overflowing so that very large sparse
/// shapes can still be described; operations that need exact flat indices
/// check with [`Shape::total_entries_exact`].
pub fn compute_strides(dims: &[usize]) -> DimVec {
    let mut strides: DimVec = SmallVec::from_elem(1, dims.len());
    for k in (0..dims.len().saturating_sub(1)).rev() {
        strides[k] = strides[k + 1].saturating_mul(dims[k + 1]);
    }
    strides
}

/// Fail with [`TensorError::InvalidArgument`] unless `perm` is a
/// permutation of `0..rank`.
pub fn ensure_permutation(perm: &[usize], rank: usize) -> Result<()> {
    if perm.len() != rank {
        return Err(TensorError::invalid_argument(format!(
            "permutation {:?} has length {} but rank is {}",
            perm,
            perm.len(),
            rank
        )));
    }
    let mut seen = vec![false; rank];
    for &axis in perm {
        if axis >= rank || seen[axis] {
            return Err(TensorError::invalid_argument(format!(
                "{:?} is not a permutation of 0..{}",
                perm, rank
            )));
        }
        seen[axis] = true;
    }
    Ok(())
}

impl Shape {
    /// Create a shape from dimension sizes.
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
            strides: compute_strides(dims),
        }
    }

    /// Rank-0 shape holding a single entry.
    pub fn scalar() -> Self {
        Self::new(&[])
    }

    /// Two-dimensional shape `(rows, cols)`.
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self::new(&[rows, cols])
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of `axis`.
    pub fn dim(&self, axis: usize) -> Result<usize> {
        ensure_axis(axis, self.rank())?;
        Ok(self.dims[axis])
    }

    /// Product of all dimensions, saturating at `usize::MAX`.
    pub fn total_entries(&self) -> usize {
        self.dims
            .iter()
            .fold(1usize, |acc, &d| acc.saturating_mul(d))
    }

    /// Product of all dimensions.
    ///
    /// # Errors
    ///
    /// [`TensorError::ArithmeticOverflow`] if the product does not fit in `usize`.
    pub fn total_entries_exact(&self) -> Result<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| {
            acc.checked_mul(d)
                .ok_or_else(|| TensorError::overflow(format!("shape {} has too many entries", self)))
        })
    }

    /// Product of all dimensions as a float; never overflows.
    pub fn total_entries_f64(&self) -> f64 {
        self.dims.iter().map(|&d| d as f64).product()
    }

    pub fn is_matrix(&self) -> bool {
        self.rank() == 2
    }

    pub fn is_square(&self) -> bool {
        self.is_matrix() && self.dims[0] == self.dims[1]
    }

    /// `(rows, cols)` of a rank-2 shape.
    pub fn matrix_dims(&self) -> Result<(usize, usize)> {
        if !self.is_matrix() {
            return Err(TensorError::invalid_argument(format!(
                "expected a matrix shape, got {}",
                self
            )));
        }
        Ok((self.dims[0], self.dims[1]))
    }

    /// Whether `index` has the right rank and every coordinate is in range.
    pub fn contains(&self, index: &[usize]) -> bool {
        index.len() == self.rank() && index.iter().zip(self.dims.iter()).all(|(&i, &d)| i < d)
    }

    /// Validate a multi-index against this shape.
    pub fn check_index(&self, index: &[usize]) -> Result<()> {
        if index.len() != self.rank() {
            return Err(TensorError::invalid_argument(format!(
                "index {:?} has rank {} but shape {} has rank {}",
                index,
                index.len(),
                self,
                self.rank()
            )));
        }
        if !self.contains(index) {
            return Err(TensorError::index_out_of_bounds(index, &self.dims));
        }
        Ok(())
    }

    /// Flat (row-major) position of a multi-index.
    ///
    /// # Errors
    ///
    /// - [`TensorError::InvalidArgument`] if the index rank differs from the shape rank
    /// - [`TensorError::IndexOutOfBounds`] if any coordinate is out of range
    /// - [`TensorError::ArithmeticOverflow`] if the shape is too large to be flattened
    pub fn flat_index(&self, index: &[usize]) -> Result<usize> {
        self.check_index(index)?;
        self.total_entries_exact()?;
        Ok(self.flat_index_unchecked(index))
    }

    /// Flat position without validation.
    ///
    /// The caller guarantees `self.contains(index)` and that the shape fits
    /// in `usize`.
    #[inline]
    pub fn flat_index_unchecked(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(self.strides.iter())
            .map(|(&i, &s)| i * s)
            .sum()
    }

    /// Multi-index of a flat position. Exact inverse of [`Shape::flat_index`].
    pub fn nd_index(&self, flat: usize) -> Result<Vec<usize>> {
        let total = self.total_entries_exact()?;
        if flat >= total {
            return Err(TensorError::index_out_of_bounds(&[flat], &[total]));
        }
        let mut out = vec![0; self.rank()];
        self.nd_index_into(flat, &mut out);
        Ok(out)
    }

    /// Write the multi-index of `flat` into `out` without validation.
    #[inline]
    pub fn nd_index_into(&self, flat: usize, out: &mut [usize]) {
        debug_assert_eq!(out.len(), self.rank());
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = (flat / self.strides[k]) % self.dims[k];
        }
    }

    /// Shape with axes `axis1` and `axis2` exchanged.
    pub fn swap_axes(&self, axis1: usize, axis2: usize) -> Result<Shape> {
        ensure_axis(axis1, self.rank())?;
        ensure_axis(axis2, self.rank())?;
        let mut dims = self.dims.clone();
        dims.swap(axis1, axis2);
        Ok(Shape::new(&dims))
    }

    /// Shape whose axis `k` is axis `perm[k]` of `self`.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidArgument`] if `perm` is not a permutation of `0..rank`.
    pub fn permute_axes(&self, perm: &[usize]) -> Result<Shape> {
        ensure_permutation(perm, self.rank())?;
        let dims: DimVec = perm.iter().map(|&p| self.dims[p]).collect();
        Ok(Shape::new(&dims))
    }

    /// Shape with the listed axes dropped, remaining axes in order.
    pub fn remove_axes(&self, axes: &[usize]) -> Result<Shape> {
        for &axis in axes {
            ensure_axis(axis, self.rank())?;
        }
        let dims: DimVec = self
            .dims
            .iter()
            .enumerate()
            .filter(|(k, _)| !axes.contains(k))
            .map(|(_, &d)| d)
            .collect();
        Ok(Shape::new(&dims))
    }

    /// Shape with new dimensions but the same number of entries.
    ///
    /// # Errors
    ///
    /// [`TensorError::ShapeMismatch`] if the entry counts differ.
    pub fn reshape(&self, dims: &[usize]) -> Result<Shape> {
        let target = Shape::new(dims);
        if self.total_entries_exact()? != target.total_entries_exact()? {
            return Err(TensorError::shape_mismatch("reshape", &self.dims, dims));
        }
        Ok(target)
    }

    /// Broadcast two shapes following the NumPy rules: trailing axes are
    /// aligned and each pair must be equal or contain a 1.
    pub fn broadcast_with(&self, other: &Shape) -> Result<Shape> {
        let rank = self.rank().max(other.rank());
        let mut dims: DimVec = SmallVec::from_elem(1, rank);
        for k in 0..rank {
            let a = dim_from_end(&self.dims, rank - 1 - k);
            let b = dim_from_end(&other.dims, rank - 1 - k);
            dims[k] = match (a, b) {
                (a, b) if a == b => a,
                (1, b) => b,
                (a, 1) => a,
                _ => {
                    return Err(TensorError::shape_mismatch(
                        "broadcast",
                        &self.dims,
                        &other.dims,
                    ))
                }
            };
        }
        Ok(Shape::new(&dims))
    }
}

fn dim_from_end(dims: &[usize], from_end: usize) -> usize {
    if from_end < dims.len() {
        dims[dims.len() - 1 - from_end]
    } else {
        1
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (k, d) in self.dims.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, ")")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(&dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(&dims)
    }
}
