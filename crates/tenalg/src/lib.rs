//! # tenalg - Generic Tensor Kernels
//!
//! Dense and sparse linear-algebra kernels written once over semirings,
//! rings and fields, with shape-driven choice between sequential, blocked
//! and concurrent execution.
//!
//! This is the **meta crate** that re-exports the tenalg components.
//!
//! ## Quick Start
//!
//! ```
//! use tenalg::prelude::*;
//!
//! let dense = DenseTensor::<f64>::ones(&[3, 3]);
//! let sparse = CooTensor::new(Shape::new(&[3, 3]), vec![vec![0, 0], vec![1, 2]], vec![2.0, 3.0])?;
//!
//! let sum = tenalg::sparse::mixed::add_dense_coo(&dense, &sparse)?;
//! assert_eq!(sum.data(), &[3.0, 1.0, 1.0, 1.0, 1.0, 4.0, 1.0, 1.0, 1.0]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Components
//!
//! ### Core ([`core`])
//!
//! Shapes, element algebras, dense tensors and the kernel dispatcher.
//!
//! ```
//! use tenalg::core::DenseTensor;
//!
//! let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
//! assert_eq!(a.matmul(&a).unwrap().data(), &[7.0, 10.0, 15.0, 22.0]);
//! ```
//!
//! ### Sparse ([`sparse`])
//!
//! COO tensors, matrices and vectors, CSR matrices and mixed dense/sparse
//! kernels.
//!
//! ```
//! use tenalg::sparse::CsrMatrix;
//! use tenalg::core::DenseTensor;
//!
//! let csr = CsrMatrix::new(vec![0, 1, 2], vec![0, 1], vec![2.0, 3.0], (2, 2)).unwrap();
//! let y = csr.mat_vec(&DenseTensor::vector(vec![1.0, 1.0])).unwrap();
//! assert_eq!(y.data(), &[2.0, 3.0]);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): concurrent kernels via Rayon
//! - `serde`: serialization support
//! - `logging`: subscriber setup for the crates' `tracing` output

pub use tenalg_core as core;
pub use tenalg_sparse as sparse;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! # Example
    //!
    //! ```
    //! use tenalg::prelude::*;
    //!
    //! let tensor = DenseTensor::<f64>::zeros(&[4, 5]);
    //! assert_eq!(tensor.shape(), &Shape::new(&[4, 5]));
    //! ```

    // Core types
    pub use crate::core::{
        DenseTensor, Dispatcher, Field, KernelConfig, Ring, Semiring, Shape, TensorError,
    };

    // Sparse types
    pub use crate::sparse::{CooMatrix, CooTensor, CooVector, CsrMatrix, SparseError};
}
