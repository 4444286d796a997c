//! # tenalg-sparse
//!
//! Sparse tensor formats and kernels for tenalg.
//!
//! This crate provides:
//! - [`CooTensor`]: N-dimensional coordinate format with sorted-merge
//!   elementwise kernels, structural operations, trace and contraction
//! - [`CooMatrix`] / [`CooVector`]: rank-2 and rank-1 coordinate formats
//! - [`CsrMatrix`]: compressed sparse rows with row-partitioned products
//! - [`mixed`]: dense ⊕ sparse kernels that touch only stored entries
//!
//! All formats are generic over the element traits of `tenalg-core`
//! ([`Semiring`](tenalg_core::Semiring), [`Ring`](tenalg_core::Ring),
//! [`Field`](tenalg_core::Field)); unlisted coordinates hold the element
//! type's additive identity.
//!
//! # Quick Start
//!
//! ```
//! use tenalg_core::{DenseTensor, Shape};
//! use tenalg_sparse::{CooTensor, CsrMatrix};
//!
//! // Unsorted input is fine: merges normalise first
//! let a = CooTensor::new(Shape::new(&[2, 2]), vec![vec![1, 1], vec![0, 0]], vec![2.0, 1.0]).unwrap();
//! let b = CooTensor::new(Shape::new(&[2, 2]), vec![vec![0, 1]], vec![5.0]).unwrap();
//! let sum = a.add(&b).unwrap();
//! assert_eq!(sum.to_dense().unwrap().data(), &[1.0, 5.0, 0.0, 2.0]);
//!
//! // Sparse × dense through CSR
//! let csr = CsrMatrix::from_dense(&sum.to_dense().unwrap()).unwrap();
//! let x = DenseTensor::vector(vec![1.0, 1.0]);
//! assert_eq!(csr.mat_vec(&x).unwrap().data(), &[6.0, 2.0]);
//! ```

pub mod coo;
pub mod coo_matrix;
pub mod coo_vector;
pub mod csr;
pub mod error;
pub mod merge;
pub mod mixed;

pub use coo::CooTensor;
pub use coo_matrix::CooMatrix;
pub use coo_vector::CooVector;
pub use csr::CsrMatrix;
pub use error::{CooError, CsrError, Result, SparseError};
