//! Error types for sparse tensor operations
//!
//! - [`CooError`]: malformed coordinate-format input
//! - [`CsrError`]: malformed compressed-row input
//! - [`SparseError`]: top-level error returned by sparse kernels, wrapping
//!   the two format errors and the shared [`TensorError`] taxonomy
//!
//! # Examples
//!
//! ```
//! use tenalg_sparse::error::{CooError, SparseError};
//! use tenalg_sparse::CooTensor;
//! use tenalg_core::Shape;
//!
//! let err = CooTensor::new(Shape::new(&[2, 2]), vec![vec![0, 5]], vec![1.0]).unwrap_err();
//! assert!(matches!(err, CooError::IndexOutOfBounds { .. }));
//!
//! let wrapped: SparseError = err.into();
//! assert!(wrapped.to_string().starts_with("COO error"));
//! ```

use tenalg_core::TensorError;
use thiserror::Error;

/// Result type of fallible sparse operations
pub type Result<T> = std::result::Result<T, SparseError>;

/// Top-level error type for sparse operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SparseError {
    /// Shape, index, argument or overflow errors shared with dense kernels
    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error("COO error: {0}")]
    Coo(#[from] CooError),

    #[error("CSR error: {0}")]
    Csr(#[from] CsrError),
}

impl SparseError {
    /// Whether this is a shape mismatch, whatever layer reported it.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, SparseError::Tensor(TensorError::ShapeMismatch { .. }))
    }
}

/// Invalid coordinate-format construction input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CooError {
    #[error("Length mismatch: {indices} indices but {values} values")]
    LengthMismatch { indices: usize, values: usize },

    #[error("Rank mismatch: index has {index_rank} coordinates but shape has rank {shape_rank}")]
    RankMismatch { index_rank: usize, shape_rank: usize },

    #[error("Index out of bounds: index {index:?} exceeds shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

/// Invalid compressed-row construction input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsrError {
    #[error("Invalid row pointers: length {len} for {nrows} rows (expected {expected})")]
    InvalidRowPtr {
        len: usize,
        nrows: usize,
        expected: usize,
    },

    #[error("Row pointer not sorted at index {idx}: {curr} > {next}")]
    RowPtrNotSorted { idx: usize, curr: usize, next: usize },

    #[error("Row pointers must start at 0, found {first}")]
    RowPtrStart { first: usize },

    #[error("Row pointers end at {last} but {nnz} entries are stored")]
    RowPtrEnd { last: usize, nnz: usize },

    #[error("Length mismatch: {col_indices} col_indices but {values} values")]
    LengthMismatch { col_indices: usize, values: usize },

    #[error("Column index out of bounds: {col_idx} >= {ncols}")]
    ColIndexOutOfBounds { col_idx: usize, ncols: usize },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}
