//! Elementwise arithmetic and reductions on dense tensors
//!
//! Binary operations require equal shapes and fail with
//! [`TensorError::ShapeMismatch`](crate::TensorError::ShapeMismatch)
//! otherwise. The [`Dispatcher`] decides between a single-pass loop and a
//! range-partitioned concurrent loop; both produce identical results.
//!
//! Division never fails on zero divisors: floating-point fields yield
//! infinity or NaN, detectable with [`DenseTensor::is_finite`] and
//! [`DenseTensor::is_nan`].
//!
//! # Examples
//!
//! ```
//! use tenalg_core::DenseTensor;
//!
//! let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
//! let b = DenseTensor::<f64>::ones(&[2, 2]);
//!
//! let sum = a.add(&b).unwrap();
//! assert_eq!(sum.data(), &[2.0, 3.0, 4.0, 5.0]);
//!
//! let quotient = a.elem_div(&sum).unwrap();
//! assert!((quotient.data()[3] - 0.8).abs() < 1e-12);
//! ```

use std::cmp::Ordering;

use crate::algebra::{arg_extreme, semiring_sum, Field, Ring, Semiring};
use crate::dispatch::{Dispatcher, Execution, Operation};
use crate::error::{ensure_same_shape, Result};
use crate::parallel::run_partitioned;

use super::types::DenseTensor;

/// Pairwise `f(lhs[i], rhs[i])` into a new buffer.
pub(crate) fn zip_with<T, F>(lhs: &[T], rhs: &[T], execution: Execution, f: F) -> Vec<T>
where
    T: Semiring,
    F: Fn(&T, &T) -> T + Send + Sync,
{
    debug_assert_eq!(lhs.len(), rhs.len());
    match execution {
        Execution::Sequential => lhs.iter().zip(rhs).map(|(a, b)| f(a, b)).collect(),
        Execution::Concurrent => {
            let mut dest = vec![T::zero(); lhs.len()];
            run_partitioned(&mut dest, 1, |range, chunk| {
                for (slot, i) in chunk.iter_mut().zip(range) {
                    *slot = f(&lhs[i], &rhs[i]);
                }
            });
            dest
        }
    }
}

/// In-place `lhs[i] = f(lhs[i], rhs[i])`.
pub(crate) fn zip_assign<T, F>(lhs: &mut [T], rhs: &[T], execution: Execution, f: F)
where
    T: Semiring,
    F: Fn(&T, &T) -> T + Send + Sync,
{
    debug_assert_eq!(lhs.len(), rhs.len());
    match execution {
        Execution::Sequential => {
            for (a, b) in lhs.iter_mut().zip(rhs) {
                *a = f(a, b);
            }
        }
        Execution::Concurrent => {
            run_partitioned(lhs, 1, |range, chunk| {
                for (slot, i) in chunk.iter_mut().zip(range) {
                    *slot = f(slot, &rhs[i]);
                }
            });
        }
    }
}

impl<T: Semiring> DenseTensor<T> {
    fn binary_op<F>(
        &self,
        other: &Self,
        op: Operation,
        name: &str,
        dispatcher: &Dispatcher,
        f: F,
    ) -> Result<Self>
    where
        F: Fn(&T, &T) -> T + Send + Sync,
    {
        ensure_same_shape(name, self.dims(), other.dims())?;
        let execution = dispatcher.elementwise(op, &self.shape);
        Ok(Self {
            shape: self.shape.clone(),
            data: zip_with(&self.data, &other.data, execution, f),
        })
    }

    fn binary_op_assign<F>(
        &mut self,
        other: &Self,
        op: Operation,
        name: &str,
        dispatcher: &Dispatcher,
        f: F,
    ) -> Result<()>
    where
        F: Fn(&T, &T) -> T + Send + Sync,
    {
        ensure_same_shape(name, self.dims(), other.dims())?;
        let execution = dispatcher.elementwise(op, &self.shape);
        zip_assign(&mut self.data, &other.data, execution, f);
        Ok(())
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.add_with(other, Dispatcher::global())
    }

    pub fn add_with(&self, other: &Self, dispatcher: &Dispatcher) -> Result<Self> {
        self.binary_op(other, Operation::Add, "add", dispatcher, |a, b| a.add(b))
    }

    /// `self += other`, elementwise.
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.add_assign_with(other, Dispatcher::global())
    }

    pub fn add_assign_with(&mut self, other: &Self, dispatcher: &Dispatcher) -> Result<()> {
        self.binary_op_assign(other, Operation::Add, "add_assign", dispatcher, |a, b| {
            a.add(b)
        })
    }

    /// Elementwise (Hadamard) product.
    pub fn elem_mult(&self, other: &Self) -> Result<Self> {
        self.elem_mult_with(other, Dispatcher::global())
    }

    pub fn elem_mult_with(&self, other: &Self, dispatcher: &Dispatcher) -> Result<Self> {
        self.binary_op(other, Operation::ElemMult, "elem_mult", dispatcher, |a, b| {
            a.mult(b)
        })
    }

    pub fn elem_mult_assign(&mut self, other: &Self) -> Result<()> {
        self.binary_op_assign(
            other,
            Operation::ElemMult,
            "elem_mult_assign",
            Dispatcher::global(),
            |a, b| a.mult(b),
        )
    }

    /// Add `scalar` to every entry.
    pub fn add_scalar(&self, scalar: &T) -> Self {
        self.map(|x| x.add(scalar))
    }

    /// Multiply every entry by `scalar`.
    pub fn mult_scalar(&self, scalar: &T) -> Self {
        self.map(|x| x.mult(scalar))
    }

    pub fn mult_scalar_assign(&mut self, scalar: &T) {
        for x in &mut self.data {
            *x = x.mult(scalar);
        }
    }

    /// Sum of all entries; zero for an empty tensor.
    pub fn sum(&self) -> T {
        semiring_sum(&self.data)
    }

    /// Smallest entry under [`Semiring::compare`]; `None` when empty.
    pub fn min(&self) -> Option<&T> {
        self.argmin_flat().map(|i| &self.data[i])
    }

    /// Largest entry under [`Semiring::compare`]; `None` when empty.
    pub fn max(&self) -> Option<&T> {
        self.argmax_flat().map(|i| &self.data[i])
    }

    /// Flat position of the first smallest entry.
    pub fn argmin_flat(&self) -> Option<usize> {
        arg_extreme(&self.data, Ordering::Less)
    }

    /// Flat position of the first largest entry.
    pub fn argmax_flat(&self) -> Option<usize> {
        arg_extreme(&self.data, Ordering::Greater)
    }

    /// Multi-index of the first smallest entry.
    pub fn argmin(&self) -> Option<Vec<usize>> {
        self.argmin_flat().and_then(|i| self.shape.nd_index(i).ok())
    }

    /// Multi-index of the first largest entry.
    pub fn argmax(&self) -> Option<Vec<usize>> {
        self.argmax_flat().and_then(|i| self.shape.nd_index(i).ok())
    }
}

impl<T: Ring> DenseTensor<T> {
    /// Elementwise difference.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.sub_with(other, Dispatcher::global())
    }

    pub fn sub_with(&self, other: &Self, dispatcher: &Dispatcher) -> Result<Self> {
        self.binary_op(other, Operation::Sub, "sub", dispatcher, |a, b| a.sub(b))
    }

    /// `self -= other`, elementwise.
    pub fn sub_assign(&mut self, other: &Self) -> Result<()> {
        self.sub_assign_with(other, Dispatcher::global())
    }

    pub fn sub_assign_with(&mut self, other: &Self, dispatcher: &Dispatcher) -> Result<()> {
        self.binary_op_assign(other, Operation::Sub, "sub_assign", dispatcher, |a, b| {
            a.sub(b)
        })
    }

    /// Additive inverse of every entry.
    pub fn neg(&self) -> Self {
        self.map(|x| x.add_inv())
    }

    /// Complex conjugate of every entry.
    pub fn conj(&self) -> Self {
        self.map(|x| x.conj())
    }

    /// Subtract `scalar` from every entry.
    pub fn sub_scalar(&self, scalar: &T) -> Self {
        self.map(|x| x.sub(scalar))
    }
}

impl<T: Field> DenseTensor<T> {
    /// Elementwise quotient.
    pub fn elem_div(&self, other: &Self) -> Result<Self> {
        self.elem_div_with(other, Dispatcher::global())
    }

    pub fn elem_div_with(&self, other: &Self, dispatcher: &Dispatcher) -> Result<Self> {
        self.binary_op(other, Operation::ElemDiv, "elem_div", dispatcher, |a, b| {
            a.div(b)
        })
    }

    pub fn elem_div_assign(&mut self, other: &Self) -> Result<()> {
        self.binary_op_assign(
            other,
            Operation::ElemDiv,
            "elem_div_assign",
            Dispatcher::global(),
            |a, b| a.div(b),
        )
    }

    /// Divide every entry by `scalar`.
    pub fn div_scalar(&self, scalar: &T) -> Self {
        self.map(|x| x.div(scalar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::dispatch::FixedPolicy;
    use crate::error::TensorError;
    use scirs2_core::num_complex::Complex64;

    fn concurrent() -> Dispatcher {
        Dispatcher::with_policy(
            KernelConfig::new().block_size(4).cache_capacity(4),
            FixedPolicy::concurrent(),
        )
        .unwrap()
    }

    fn sequential() -> Dispatcher {
        Dispatcher::with_policy(
            KernelConfig::new().block_size(4).cache_capacity(4),
            FixedPolicy::sequential(),
        )
        .unwrap()
    }

    #[test]
    fn test_add_sub() {
        let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
        let b = DenseTensor::from_vec(vec![0.5, -2.0, 10.0], &[3]).unwrap();
        assert_eq!(a.add(&b).unwrap().data(), &[1.5, 0.0, 13.0]);
        assert_eq!(a.sub(&b).unwrap().data(), &[0.5, 4.0, -7.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DenseTensor::<f64>::zeros(&[2, 3]);
        let b = DenseTensor::<f64>::zeros(&[3, 2]);
        assert!(matches!(a.add(&b), Err(TensorError::ShapeMismatch { .. })));
        assert!(a.elem_div(&b).is_err());
    }

    #[test]
    fn test_assign_leaves_receiver_on_error() {
        let mut a = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = DenseTensor::<f64>::ones(&[3]);
        assert!(a.sub_assign(&b).is_err());
        assert_eq!(a.data(), &[1.0, 2.0]);
    }

    #[test]
    fn test_assign_variants() {
        let mut a = DenseTensor::from_vec(vec![2.0, 4.0], &[2]).unwrap();
        let b = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        a.add_assign(&b).unwrap();
        assert_eq!(a.data(), &[3.0, 6.0]);
        a.elem_mult_assign(&b).unwrap();
        assert_eq!(a.data(), &[3.0, 12.0]);
        a.elem_div_assign(&b).unwrap();
        assert_eq!(a.data(), &[3.0, 6.0]);
        a.sub_assign_with(&b, &concurrent()).unwrap();
        assert_eq!(a.data(), &[2.0, 4.0]);
    }

    #[test]
    fn test_division_by_zero_is_not_an_error() {
        let a = DenseTensor::from_vec(vec![1.0, 0.0], &[2]).unwrap();
        let b = DenseTensor::<f64>::zeros(&[2]);
        let q = a.elem_div(&b).unwrap();
        assert!(q.data()[0].is_infinite());
        assert!(q.data()[1].is_nan());
        assert!(!q.is_finite());
        assert!(q.is_nan());
    }

    #[test]
    fn test_concurrent_matches_sequential() {
        let a: DenseTensor<f64> =
            DenseTensor::from_vec((0..257).map(|i| (i as f64).sin()).collect(), &[257]).unwrap();
        let b: DenseTensor<f64> =
            DenseTensor::from_vec((0..257).map(|i| (i as f64 * 0.3).cos()).collect(), &[257])
                .unwrap();
        let par = concurrent();
        let seq = sequential();
        assert_eq!(a.add_with(&b, &par).unwrap(), a.add_with(&b, &seq).unwrap());
        assert_eq!(
            a.elem_mult_with(&b, &par).unwrap(),
            a.elem_mult_with(&b, &seq).unwrap()
        );
        assert_eq!(
            a.elem_div_with(&b, &par).unwrap(),
            a.elem_div_with(&b, &seq).unwrap()
        );
    }

    #[test]
    fn test_scalar_ops() {
        let a = DenseTensor::from_vec(vec![1.0, -2.0], &[2]).unwrap();
        assert_eq!(a.add_scalar(&1.0).data(), &[2.0, -1.0]);
        assert_eq!(a.mult_scalar(&3.0).data(), &[3.0, -6.0]);
        assert_eq!(a.div_scalar(&2.0).data(), &[0.5, -1.0]);
        assert_eq!(a.sub_scalar(&1.0).data(), &[0.0, -3.0]);
        assert_eq!(a.neg().data(), &[-1.0, 2.0]);
    }

    #[test]
    fn test_reductions() {
        let a = DenseTensor::from_vec(vec![3.0, -1.0, 7.0, 7.0, -1.0, 0.0], &[2, 3]).unwrap();
        assert_eq!(a.sum(), 15.0);
        assert_eq!(a.min(), Some(&-1.0));
        assert_eq!(a.max(), Some(&7.0));
        assert_eq!(a.argmin(), Some(vec![0, 1]));
        assert_eq!(a.argmax(), Some(vec![0, 2]));
        assert_eq!(DenseTensor::<f64>::zeros(&[0]).argmax(), None);
    }

    #[test]
    fn test_complex_conj_and_max_by_magnitude() {
        let a = DenseTensor::vector(vec![
            Complex64::new(1.0, 1.0),
            Complex64::new(0.0, -3.0),
            Complex64::new(2.0, 0.0),
        ]);
        assert_eq!(a.conj().data()[1], Complex64::new(0.0, 3.0));
        assert_eq!(a.argmax_flat(), Some(1));
        assert_eq!(a.argmin_flat(), Some(0));
    }

    #[test]
    fn test_integer_ring_elementwise() {
        let a = DenseTensor::vector(vec![1i64, 2, 3]);
        let b = DenseTensor::vector(vec![4i64, 5, 6]);
        assert_eq!(a.elem_mult(&b).unwrap().data(), &[4, 10, 18]);
        assert_eq!(b.sub(&a).unwrap().data(), &[3, 3, 3]);
    }
}
