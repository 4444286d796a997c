//! Error types for tensor kernels
//!
//! Every public kernel validates its operands before the first write and
//! reports failures through [`TensorError`]. Numeric edge cases such as
//! division by zero are not errors: they surface as the element type's own
//! infinity/NaN representation and can be detected with the property checks
//! on [`DenseTensor`](crate::DenseTensor).
//!
//! # Examples
//!
//! ```
//! use tenalg_core::{Shape, TensorError};
//!
//! let shape = Shape::new(&[2, 3]);
//! let err = shape.reshape(&[7]).unwrap_err();
//! assert!(matches!(err, TensorError::ShapeMismatch { .. }));
//! ```

use thiserror::Error;

/// Result alias used throughout the kernel layer.
pub type Result<T> = std::result::Result<T, TensorError>;

/// Error type for tensor kernel operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    /// Operand shapes are incompatible for the requested operation.
    #[error("{operation}: shape mismatch between {lhs:?} and {rhs:?}")]
    ShapeMismatch {
        operation: String,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    /// A multi-index or flat index lies outside the tensor.
    #[error("Index {index:?} is out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    /// An axis argument is not smaller than the rank.
    #[error("Axis {axis} is out of bounds for a tensor of rank {rank}")]
    AxisOutOfBounds { axis: usize, rank: usize },

    /// Malformed argument: bad permutation, non-square matrix, zero block size...
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested materialisation exceeds the addressable size.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

impl TensorError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(operation: impl Into<String>, lhs: &[usize], rhs: &[usize]) -> Self {
        TensorError::ShapeMismatch {
            operation: operation.into(),
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: &[usize], shape: &[usize]) -> Self {
        TensorError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: shape.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        TensorError::InvalidArgument(message.into())
    }

    /// Create an arithmetic overflow error
    pub fn overflow(message: impl Into<String>) -> Self {
        TensorError::ArithmeticOverflow(message.into())
    }
}

/// Fail with [`TensorError::ShapeMismatch`] unless both shapes are equal.
pub fn ensure_same_shape(operation: &str, lhs: &[usize], rhs: &[usize]) -> Result<()> {
    if lhs != rhs {
        return Err(TensorError::shape_mismatch(operation, lhs, rhs));
    }
    Ok(())
}

/// Fail with [`TensorError::AxisOutOfBounds`] unless `axis < rank`.
pub fn ensure_axis(axis: usize, rank: usize) -> Result<()> {
    if axis >= rank {
        return Err(TensorError::AxisOutOfBounds { axis, rank });
    }
    Ok(())
}
