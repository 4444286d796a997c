//! Dense tensor storage and kernels
//!
//! [`DenseTensor`] owns a flat, row-major buffer whose length equals the
//! entry count of its [`Shape`](crate::Shape). Kernels are split by concern:
//!
//! - [`types`]: construction, accessors, indexing, reshape, ndarray interop
//! - [`elementwise`]: pairwise and scalar arithmetic, reductions
//! - [`transpose`]: axis swaps, permutations and the four matrix transpose kernels
//! - [`products`]: dot/inner/outer products, norms, matrix and tensor products
//! - [`properties`]: tolerance comparisons and structural predicates
//!
//! Compound assignment (`*_assign`) variants validate their operands before
//! the first write, so a failed call leaves the receiver untouched.

pub mod elementwise;
pub mod products;
pub mod properties;
pub mod transpose;
pub mod types;

pub use types::DenseTensor;
