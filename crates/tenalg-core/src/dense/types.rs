//! Dense tensor type definition and basic operations
//!
//! This module defines [`DenseTensor`] with its constructors, accessors and
//! shape-level operations. Arithmetic lives in the sibling modules.

use std::ops::{Index, IndexMut};

use scirs2_core::ndarray_ext::{Array, IxDyn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::algebra::Semiring;
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Dense N-dimensional tensor over an arbitrary element type
///
/// Entries are stored in a flat `Vec<T>` in row-major order, matching the
/// strides of [`Shape`]. Matrices are rank-2 tensors and vectors rank-1
/// tensors; no separate types are needed.
///
/// # Examples
///
/// ```
/// use tenalg_core::DenseTensor;
///
/// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// assert_eq!(t.dims(), &[2, 3]);
/// assert_eq!(t[&[1, 0]], 4.0);
///
/// let zeros = DenseTensor::<f64>::zeros(&[2, 2]);
/// assert!(zeros.data().iter().all(|&x| x == 0.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DenseTensor<T> {
    pub(crate) shape: Shape,
    pub(crate) data: Vec<T>,
}

/// Entry count of `shape` if a buffer of `T` that large is addressable.
///
/// # Errors
///
/// [`TensorError::ArithmeticOverflow`] if the entry count overflows `usize`
/// or the buffer would exceed `isize::MAX` bytes.
pub fn checked_len<T>(shape: &Shape) -> Result<usize> {
    let len = shape.total_entries_exact()?;
    let bytes = len
        .checked_mul(std::mem::size_of::<T>().max(1))
        .filter(|&b| b <= isize::MAX as usize);
    if bytes.is_none() {
        return Err(TensorError::overflow(format!(
            "a dense tensor of shape {} exceeds the maximum array size",
            shape
        )));
    }
    Ok(len)
}

impl<T> DenseTensor<T> {
    /// Create a tensor from a shape and row-major data.
    ///
    /// # Errors
    ///
    /// [`TensorError::ShapeMismatch`] if `data.len()` is not the entry count of `shape`.
    pub fn new(shape: Shape, data: Vec<T>) -> Result<Self> {
        let expected = shape.total_entries_exact()?;
        if data.len() != expected {
            return Err(TensorError::shape_mismatch(
                "DenseTensor::new",
                shape.dims(),
                &[data.len()],
            ));
        }
        Ok(Self { shape, data })
    }

    /// Create a tensor from row-major data and dimensions.
    pub fn from_vec(data: Vec<T>, dims: &[usize]) -> Result<Self> {
        Self::new(Shape::new(dims), data)
    }

    /// Rank-1 tensor owning `data`.
    pub fn vector(data: Vec<T>) -> Self {
        let shape = Shape::new(&[data.len()]);
        Self { shape, data }
    }

    /// Rank-2 tensor with `rows × cols` entries.
    pub fn matrix(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        Self::new(Shape::matrix(rows, cols), data)
    }

    /// New tensor of the same kind with a different shape and data.
    pub fn make_like(&self, shape: Shape, data: Vec<T>) -> Result<Self> {
        Self::new(shape, data)
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

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major entries.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// `(rows, cols)` of a matrix.
    pub fn matrix_dims(&self) -> Result<(usize, usize)> {
        self.shape.matrix_dims()
    }

    /// Entry at a multi-index.
    pub fn get(&self, index: &[usize]) -> Result<&T> {
        let flat = self.shape.flat_index(index)?;
        Ok(&self.data[flat])
    }

    /// Overwrite the entry at a multi-index.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        let flat = self.shape.flat_index(index)?;
        self.data[flat] = value;
        Ok(())
    }

    /// Apply `f` to every entry.
    pub fn map<U, F>(&self, f: F) -> DenseTensor<U>
    where
        F: FnMut(&T) -> U,
    {
        DenseTensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> DenseTensor<T> {
    /// Tensor of shape `dims` with every entry equal to `value`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer cannot be allocated; use [`DenseTensor::try_full`]
    /// for shapes that may exceed the maximum array size.
    pub fn full(dims: &[usize], value: T) -> Self {
        let shape = Shape::new(dims);
        let data = vec![value; shape.total_entries()];
        Self { shape, data }
    }

    /// Fallible [`DenseTensor::full`].
    ///
    /// # Errors
    ///
    /// [`TensorError::ArithmeticOverflow`] if the buffer would exceed the
    /// maximum array size.
    pub fn try_full(shape: &Shape, value: T) -> Result<Self> {
        let len = checked_len::<T>(shape)?;
        Ok(Self {
            shape: shape.clone(),
            data: vec![value; len],
        })
    }

    /// Same entries viewed with new dimensions.
    ///
    /// # Errors
    ///
    /// [`TensorError::ShapeMismatch`] if the entry counts differ.
    pub fn reshape(&self, dims: &[usize]) -> Result<Self> {
        let shape = self.shape.reshape(dims)?;
        Ok(Self {
            shape,
            data: self.data.clone(),
        })
    }

    /// Rank-1 view of all entries.
    pub fn flatten(&self) -> Self {
        Self::vector(self.data.clone())
    }

    /// Convert to a `scirs2_core` ndarray.
    pub fn to_array(&self) -> Result<Array<T, IxDyn>> {
        Array::from_shape_vec(IxDyn(self.dims()), self.data.clone())
            .map_err(|e| TensorError::invalid_argument(e.to_string()))
    }

    /// Build from a `scirs2_core` ndarray (any memory layout).
    pub fn from_array(array: &Array<T, IxDyn>) -> Self {
        Self {
            shape: Shape::new(array.shape()),
            data: array.iter().cloned().collect(),
        }
    }
}

impl<T: Semiring> DenseTensor<T> {
    /// Tensor of additive identities.
    ///
    /// # Panics
    ///
    /// Panics if the buffer cannot be allocated; see [`DenseTensor::try_zeros`].
    pub fn zeros(dims: &[usize]) -> Self {
        Self::full(dims, T::zero())
    }

    /// Tensor of multiplicative identities.
    ///
    /// # Panics
    ///
    /// Panics if the buffer cannot be allocated; see [`DenseTensor::try_full`].
    pub fn ones(dims: &[usize]) -> Self {
        Self::full(dims, T::one())
    }

    /// Zero tensor of `shape`, failing instead of aborting when it cannot be allocated.
    ///
    /// # Errors
    ///
    /// [`TensorError::ArithmeticOverflow`] if the buffer would exceed the
    /// maximum array size.
    pub fn try_zeros(shape: &Shape) -> Result<Self> {
        Self::try_full(shape, T::zero())
    }

    /// `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut out = Self::zeros(&[n, n]);
        for i in 0..n {
            out.data[i * n + i] = T::one();
        }
        out
    }
}

impl<T, const N: usize> Index<&[usize; N]> for DenseTensor<T> {
    type Output = T;

    fn index(&self, index: &[usize; N]) -> &T {
        match self.shape.flat_index(index) {
            Ok(flat) => &self.data[flat],
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T, const N: usize> IndexMut<&[usize; N]> for DenseTensor<T> {
    fn index_mut(&mut self, index: &[usize; N]) -> &mut T {
        match self.shape.flat_index(index) {
            Ok(flat) => &mut self.data[flat],
            Err(e) => panic!("{}", e),
        }
    }
}
