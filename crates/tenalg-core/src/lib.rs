//! # tenalg-core
//!
//! Generic shapes, element algebras, dense kernels and kernel dispatch for
//! tenalg.
//!
//! This crate provides the foundation the sparse kernels build on:
//!
//! - **Shapes** ([`Shape`]) with row-major strides, index arithmetic and
//!   axis permutations
//! - **Element algebras** ([`Semiring`], [`Ring`], [`Field`]) so every kernel
//!   is written once for reals, complex numbers, integers and booleans
//! - **Dense tensors** ([`DenseTensor`]) with elementwise arithmetic,
//!   reductions, transposes, matrix and tensor products
//! - **Dispatch** ([`Dispatcher`]) choosing sequential, blocked or concurrent
//!   kernels from operand shapes, with a small recent-shape cache
//!
//! ## Quick Start
//!
//! ```
//! use tenalg_core::DenseTensor;
//!
//! let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
//! let b = DenseTensor::<f64>::ones(&[2, 3]);
//!
//! let sum = a.add(&b).unwrap();
//! assert_eq!(sum.data(), &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
//!
//! let at = a.transpose().unwrap();
//! assert_eq!(at.dims(), &[3, 2]);
//!
//! let gram = a.matmul(&at).unwrap();
//! assert_eq!(gram.data(), &[14.0, 32.0, 32.0, 77.0]);
//! ```
//!
//! ## Injecting a dispatcher
//!
//! Every kernel that picks an algorithm has a `*_with` variant taking an
//! explicit [`Dispatcher`]. The plain variants use [`Dispatcher::global`],
//! which is configured from the environment on first use.
//!
//! ```
//! use tenalg_core::{DenseTensor, Dispatcher, FixedPolicy, KernelConfig};
//!
//! let dispatcher =
//!     Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::concurrent()).unwrap();
//! let a = DenseTensor::<f64>::ones(&[64, 64]);
//! let b = a.add_with(&a, &dispatcher).unwrap();
//! assert!(b.data().iter().all(|&x| x == 2.0));
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): concurrent kernels via Rayon
//! - `serde`: serialization of shapes, tensors and configuration
//! - `logging`: [`logging::init_logging`] backed by `tracing-subscriber`

pub mod algebra;
pub mod cache;
pub mod config;
pub mod dense;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod parallel;
pub mod shape;

#[cfg(test)]
mod property_tests;

pub use algebra::{Field, Ring, Semiring};
pub use cache::{CacheStats, ShapeCache};
pub use config::{configure_thread_pool, KernelConfig};
pub use dense::DenseTensor;
pub use dispatch::{
    DispatchPolicy, Dispatcher, Execution, FixedPolicy, KernelChoice, MatMulAlgorithm, Operation,
    ThresholdPolicy, TransposeAlgorithm,
};
pub use error::{Result, TensorError};
pub use shape::Shape;
