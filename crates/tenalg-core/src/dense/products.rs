//! Vector, matrix and tensor products
//!
//! # Matrix products
//!
//! Four kernels compute `C = A × B` for a `m × k` matrix `A` and a `k × n`
//! matrix `B`:
//!
//! | Kernel        | Loop order          | Notes                                  |
//! |---------------|---------------------|----------------------------------------|
//! | `Standard`    | i, j, k             | inner products                         |
//! | `Reordered`   | i, k, j             | streams rows of `B`                    |
//! | `Blocked`     | i, k, j over tiles  | tiles of `block_size`                  |
//! | `Concurrent`  | i, k, j             | output rows split over the worker pool |
//!
//! Every kernel accumulates each output entry over `k` in ascending order,
//! starting from zero, so all four return bit-identical results.
//!
//! # Tensor contraction
//!
//! [`DenseTensor::tensor_dot`] reduces a contraction to a matrix product:
//! the contracted axes of the left operand are moved to the back, those of
//! the right operand to the front, both are flattened to matrices, multiplied,
//! and the product is reshaped to the free axes of both operands in order.
//! [`plan_contraction`] performs the validation and bookkeeping and is shared
//! with the sparse crate.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::DenseTensor;
//!
//! let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
//! let b = DenseTensor::from_vec(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]).unwrap();
//! assert_eq!(a.matmul(&b).unwrap().data(), &[19.0, 22.0, 43.0, 50.0]);
//!
//! let v = DenseTensor::vector(vec![1.0, 2.0, 3.0]);
//! let s = v.tensor_dot(&v, &[0], &[0]).unwrap();
//! assert_eq!(s.rank(), 0);
//! assert_eq!(s.data(), &[14.0]);
//! ```

use crate::algebra::{semiring_sum, Ring, Semiring};
use crate::dispatch::{Dispatcher, MatMulAlgorithm};
use crate::error::{ensure_axis, ensure_same_shape, Result, TensorError};
use crate::parallel::run_partitioned;
use crate::shape::Shape;

use super::types::{checked_len, DenseTensor};

/// `m × k` times `k × n` with i-j-k inner products.
pub fn matmul_standard<T: Semiring>(a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Vec<T> {
    let mut dest = Vec::with_capacity(m * n);
    for i in 0..m {
        let row = &a[i * k..(i + 1) * k];
        for j in 0..n {
            let mut acc = T::zero();
            for (p, aip) in row.iter().enumerate() {
                acc = acc.add(&aip.mult(&b[p * n + j]));
            }
            dest.push(acc);
        }
    }
    dest
}

/// Accumulate `a[i, :] × B` into `out_row` with the i-k-j loop order.
#[inline]
fn accumulate_row<T: Semiring>(a_row: &[T], b: &[T], n: usize, out_row: &mut [T]) {
    for (p, aip) in a_row.iter().enumerate() {
        let b_row = &b[p * n..(p + 1) * n];
        for (out, bpj) in out_row.iter_mut().zip(b_row) {
            *out = out.add(&aip.mult(bpj));
        }
    }
}

/// `m × k` times `k × n` with the i-k-j loop order.
pub fn matmul_reordered<T: Semiring>(a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Vec<T> {
    let mut dest = vec![T::zero(); m * n];
    if n == 0 {
        return dest;
    }
    for (i, out_row) in dest.chunks_mut(n).enumerate() {
        accumulate_row(&a[i * k..(i + 1) * k], b, n, out_row);
    }
    dest
}

/// `m × k` times `k × n` over square tiles of `block_size`.
pub fn matmul_blocked<T: Semiring>(
    a: &[T],
    b: &[T],
    m: usize,
    k: usize,
    n: usize,
    block_size: usize,
) -> Vec<T> {
    let bs = block_size.max(1);
    let mut dest = vec![T::zero(); m * n];
    for ii in (0..m).step_by(bs) {
        let i_end = (ii + bs).min(m);
        for pp in (0..k).step_by(bs) {
            let p_end = (pp + bs).min(k);
            for jj in (0..n).step_by(bs) {
                let j_end = (jj + bs).min(n);
                for i in ii..i_end {
                    for p in pp..p_end {
                        let aip = &a[i * k + p];
                        for j in jj..j_end {
                            dest[i * n + j] = dest[i * n + j].add(&aip.mult(&b[p * n + j]));
                        }
                    }
                }
            }
        }
    }
    dest
}

/// [`matmul_reordered`] with output rows split over the worker pool.
pub fn matmul_concurrent<T: Semiring>(a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Vec<T> {
    let mut dest = vec![T::zero(); m * n];
    if dest.is_empty() {
        return dest;
    }
    run_partitioned(&mut dest, n, |rows, chunk| {
        for (local, i) in rows.enumerate() {
            accumulate_row(
                &a[i * k..(i + 1) * k],
                b,
                n,
                &mut chunk[local * n..(local + 1) * n],
            );
        }
    });
    dest
}

/// Run the chosen matrix product kernel.
pub fn matmul_kernel<T: Semiring>(
    a: &[T],
    b: &[T],
    (m, k, n): (usize, usize, usize),
    algorithm: MatMulAlgorithm,
    block_size: usize,
) -> Vec<T> {
    match algorithm {
        MatMulAlgorithm::Standard => matmul_standard(a, b, m, k, n),
        MatMulAlgorithm::Reordered => matmul_reordered(a, b, m, k, n),
        MatMulAlgorithm::Blocked => matmul_blocked(a, b, m, k, n, block_size),
        MatMulAlgorithm::Concurrent => matmul_concurrent(a, b, m, k, n),
    }
}

/// Validated bookkeeping for a tensor contraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractionPlan {
    /// Permutation moving the contracted axes of the left operand to the back
    pub perm_a: Vec<usize>,
    /// Permutation moving the contracted axes of the right operand to the front
    pub perm_b: Vec<usize>,
    /// Free axes of the left operand followed by free axes of the right operand
    pub result_dims: Vec<usize>,
    /// Product of the left operand's free dimensions
    pub rows: usize,
    /// Product of the contracted dimensions
    pub inner: usize,
    /// Product of the right operand's free dimensions
    pub cols: usize,
}

fn check_axes(axes: &[usize], rank: usize) -> Result<()> {
    for (pos, &axis) in axes.iter().enumerate() {
        ensure_axis(axis, rank)?;
        if axes[..pos].contains(&axis) {
            return Err(TensorError::invalid_argument(format!(
                "axis {} is contracted twice",
                axis
            )));
        }
    }
    Ok(())
}

/// Validate a contraction of `a` over `axes_a` with `b` over `axes_b`.
///
/// # Errors
///
/// - [`TensorError::ShapeMismatch`] if the axis lists differ in length or a
///   pair of contracted axes differs in extent
/// - [`TensorError::AxisOutOfBounds`] / [`TensorError::InvalidArgument`] for
///   out-of-range or repeated axes
/// - [`TensorError::ArithmeticOverflow`] if a flattened extent overflows
pub fn plan_contraction(
    a: &Shape,
    b: &Shape,
    axes_a: &[usize],
    axes_b: &[usize],
) -> Result<ContractionPlan> {
    if axes_a.len() != axes_b.len() {
        return Err(TensorError::shape_mismatch("tensor_dot", axes_a, axes_b));
    }
    check_axes(axes_a, a.rank())?;
    check_axes(axes_b, b.rank())?;
    for (&p, &q) in axes_a.iter().zip(axes_b) {
        if a.dims()[p] != b.dims()[q] {
            return Err(TensorError::shape_mismatch("tensor_dot", a.dims(), b.dims()));
        }
    }

    let free_a: Vec<usize> = (0..a.rank()).filter(|k| !axes_a.contains(k)).collect();
    let free_b: Vec<usize> = (0..b.rank()).filter(|k| !axes_b.contains(k)).collect();

    let mut perm_a = free_a.clone();
    perm_a.extend_from_slice(axes_a);
    let mut perm_b = axes_b.to_vec();
    perm_b.extend_from_slice(&free_b);

    let dims_of = |shape: &Shape, axes: &[usize]| -> Vec<usize> {
        axes.iter().map(|&k| shape.dims()[k]).collect()
    };
    let free_dims_a = dims_of(a, &free_a);
    let free_dims_b = dims_of(b, &free_b);

    let rows = Shape::new(&free_dims_a).total_entries_exact()?;
    let inner = Shape::new(&dims_of(a, axes_a)).total_entries_exact()?;
    let cols = Shape::new(&free_dims_b).total_entries_exact()?;

    let mut result_dims = free_dims_a;
    result_dims.extend(free_dims_b);

    Ok(ContractionPlan {
        perm_a,
        perm_b,
        result_dims,
        rows,
        inner,
        cols,
    })
}

fn ensure_vector<T>(name: &str, t: &DenseTensor<T>) -> Result<()> {
    if t.rank() != 1 {
        return Err(TensorError::invalid_argument(format!(
            "{} expects a vector, got shape {}",
            name,
            t.shape()
        )));
    }
    Ok(())
}

impl<T: Semiring> DenseTensor<T> {
    /// Sum of entrywise products of two equally shaped vectors.
    pub fn dot(&self, other: &Self) -> Result<T> {
        ensure_vector("dot", self)?;
        ensure_same_shape("dot", self.dims(), other.dims())?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .fold(T::zero(), |acc, (a, b)| acc.add(&a.mult(b))))
    }

    /// Outer product of two vectors: an `n × m` matrix.
    pub fn outer(&self, other: &Self) -> Result<Self> {
        ensure_vector("outer", self)?;
        ensure_vector("outer", other)?;
        let shape = Shape::matrix(self.len(), other.len());
        checked_len::<T>(&shape)?;
        let data = self
            .data
            .iter()
            .flat_map(|a| other.data.iter().map(move |b| a.mult(b)))
            .collect();
        Ok(Self { shape, data })
    }

    fn matmul_dims(&self, other: &Self) -> Result<(usize, usize, usize)> {
        let (m, k) = self.matrix_dims()?;
        let (k2, n) = other.matrix_dims()?;
        if k != k2 {
            return Err(TensorError::shape_mismatch("matmul", self.dims(), other.dims()));
        }
        Ok((m, k, n))
    }

    /// Matrix product.
    ///
    /// # Errors
    ///
    /// - [`TensorError::InvalidArgument`] if either operand is not a matrix
    /// - [`TensorError::ShapeMismatch`] if the inner dimensions differ
    /// - [`TensorError::ArithmeticOverflow`] if the `m × n` result exceeds the
    ///   maximum array size
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        self.matmul_with(other, Dispatcher::global())
    }

    pub fn matmul_with(&self, other: &Self, dispatcher: &Dispatcher) -> Result<Self> {
        self.matmul_dims(other)?;
        let algorithm = dispatcher.matmul(&self.shape, &other.shape);
        self.matmul_using(other, algorithm, dispatcher.block_size())
    }

    /// Matrix product with an explicitly chosen kernel.
    pub fn matmul_using(
        &self,
        other: &Self,
        algorithm: MatMulAlgorithm,
        block_size: usize,
    ) -> Result<Self> {
        let (m, k, n) = self.matmul_dims(other)?;
        let shape = Shape::matrix(m, n);
        checked_len::<T>(&shape)?;
        let data = matmul_kernel(&self.data, &other.data, (m, k, n), algorithm, block_size);
        Ok(Self { shape, data })
    }

    /// Matrix-vector product.
    pub fn mat_vec(&self, vector: &Self) -> Result<Self> {
        let (m, k) = self.matrix_dims()?;
        ensure_vector("mat_vec", vector)?;
        if vector.len() != k {
            return Err(TensorError::shape_mismatch("mat_vec", self.dims(), vector.dims()));
        }
        let data = (0..m)
            .map(|i| {
                self.data[i * k..(i + 1) * k]
                    .iter()
                    .zip(&vector.data)
                    .fold(T::zero(), |acc, (a, x)| acc.add(&a.mult(x)))
            })
            .collect();
        Ok(Self::vector(data))
    }

    /// Contract `axes_a` of `self` with `axes_b` of `other`.
    ///
    /// The result has the free axes of `self` followed by the free axes of
    /// `other`. Contracting every axis yields a rank-0 tensor.
    pub fn tensor_dot(&self, other: &Self, axes_a: &[usize], axes_b: &[usize]) -> Result<Self> {
        self.tensor_dot_with(other, axes_a, axes_b, Dispatcher::global())
    }

    pub fn tensor_dot_with(
        &self,
        other: &Self,
        axes_a: &[usize],
        axes_b: &[usize],
        dispatcher: &Dispatcher,
    ) -> Result<Self> {
        let plan = plan_contraction(&self.shape, &other.shape, axes_a, axes_b)?;
        let result_shape = Shape::new(&plan.result_dims);
        checked_len::<T>(&result_shape)?;
        let lhs = self.permute_with(&plan.perm_a, dispatcher)?;
        let rhs = other.permute_with(&plan.perm_b, dispatcher)?;

        let lhs_shape = Shape::matrix(plan.rows, plan.inner);
        let rhs_shape = Shape::matrix(plan.inner, plan.cols);
        let algorithm = dispatcher.matmul(&lhs_shape, &rhs_shape);
        let data = matmul_kernel(
            &lhs.data,
            &rhs.data,
            (plan.rows, plan.inner, plan.cols),
            algorithm,
            dispatcher.block_size(),
        );
        Self::new(result_shape, data)
    }

    /// Generalised trace over two axes of equal extent.
    ///
    /// The result drops both axes; each remaining entry is the sum of the
    /// diagonal `(d, d)` over the two axes.
    pub fn tensor_tr(&self, axis1: usize, axis2: usize) -> Result<Self> {
        let (result_shape, len) = trace_shape(&self.shape, axis1, axis2)?;
        let rank = self.rank();
        let mut out = Vec::with_capacity(result_shape.total_entries());
        let mut index = vec![0; rank];
        let mut rest = vec![0; result_shape.rank()];
        for flat in 0..result_shape.total_entries() {
            result_shape.nd_index_into(flat, &mut rest);
            let mut free = rest.iter();
            for (k, slot) in index.iter_mut().enumerate() {
                if k != axis1 && k != axis2 {
                    *slot = free.next().copied().unwrap_or(0);
                }
            }
            let diagonal: Vec<&T> = (0..len)
                .map(|d| {
                    index[axis1] = d;
                    index[axis2] = d;
                    &self.data[self.shape.flat_index_unchecked(&index)]
                })
                .collect();
            out.push(semiring_sum(diagonal));
        }
        Self::new(result_shape, out)
    }
}

/// Result shape and diagonal length of a trace over `axis1` and `axis2`.
///
/// # Errors
///
/// - [`TensorError::InvalidArgument`] if the axes coincide
/// - [`TensorError::AxisOutOfBounds`] if an axis is out of range
/// - [`TensorError::ShapeMismatch`] if the two extents differ
pub fn trace_shape(shape: &Shape, axis1: usize, axis2: usize) -> Result<(Shape, usize)> {
    ensure_axis(axis1, shape.rank())?;
    ensure_axis(axis2, shape.rank())?;
    if axis1 == axis2 {
        return Err(TensorError::invalid_argument(format!(
            "trace axes must differ, got {} twice",
            axis1
        )));
    }
    let (d1, d2) = (shape.dims()[axis1], shape.dims()[axis2]);
    if d1 != d2 {
        return Err(TensorError::shape_mismatch("tensor_tr", &[d1], &[d2]));
    }
    Ok((shape.remove_axes(&[axis1, axis2])?, d1))
}

impl<T: Ring> DenseTensor<T> {
    /// Inner product `Σ a_i * conj(b_i)` of two vectors.
    pub fn inner(&self, other: &Self) -> Result<T> {
        ensure_vector("inner", self)?;
        ensure_same_shape("inner", self.dims(), other.dims())?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .fold(T::zero(), |acc, (a, b)| acc.add(&a.mult(&b.conj()))))
    }

    /// Euclidean (Frobenius) norm, scaled by the largest magnitude so that
    /// intermediate squares neither overflow nor underflow.
    pub fn norm(&self) -> f64 {
        let max = self.data.iter().map(Ring::mag).fold(0.0f64, f64::max);
        if max == 0.0 || !max.is_finite() {
            return max;
        }
        let sum: f64 = self
            .data
            .iter()
            .map(|x| {
                let scaled = x.mag() / max;
                scaled * scaled
            })
            .sum();
        max * sum.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::dispatch::FixedPolicy;
    use scirs2_core::num_complex::Complex64;

    fn ramp(dims: &[usize], scale: f64) -> DenseTensor<f64> {
        let n: usize = dims.iter().product();
        DenseTensor::from_vec((0..n).map(|x| (x as f64 * scale).sin()).collect(), dims).unwrap()
    }

    #[test]
    fn test_matmul_kernels_bit_identical() {
        let a = ramp(&[13, 7], 0.37);
        let b = ramp(&[7, 11], 1.13);
        let expected = a.matmul_using(&b, MatMulAlgorithm::Standard, 4).unwrap();
        for algorithm in [
            MatMulAlgorithm::Reordered,
            MatMulAlgorithm::Blocked,
            MatMulAlgorithm::Concurrent,
        ] {
            for bs in [1, 3, 64] {
                assert_eq!(a.matmul_using(&b, algorithm, bs).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_matmul_shape_errors() {
        let a = DenseTensor::<f64>::zeros(&[2, 3]);
        assert!(matches!(
            a.matmul(&a),
            Err(TensorError::ShapeMismatch { .. })
        ));
        let v = DenseTensor::<f64>::zeros(&[3]);
        assert!(a.matmul(&v).is_err());
    }

    #[test]
    fn test_products_of_empty_operands_overflow() {
        let tall = DenseTensor::<f64>::zeros(&[1 << 33, 0]);
        let wide = DenseTensor::<f64>::zeros(&[0, 1 << 33]);
        for algorithm in [
            MatMulAlgorithm::Standard,
            MatMulAlgorithm::Reordered,
            MatMulAlgorithm::Blocked,
            MatMulAlgorithm::Concurrent,
        ] {
            assert!(matches!(
                tall.matmul_using(&wide, algorithm, 8),
                Err(TensorError::ArithmeticOverflow(_))
            ));
        }
        assert!(matches!(
            tall.matmul(&wide),
            Err(TensorError::ArithmeticOverflow(_))
        ));
        assert!(matches!(
            tall.tensor_dot(&wide, &[1], &[0]),
            Err(TensorError::ArithmeticOverflow(_))
        ));

        // the other order is a valid empty product
        let empty = wide.matmul(&tall).unwrap();
        assert_eq!(empty.dims(), &[0, 0]);
    }

    #[test]
    fn test_matmul_identity() {
        let a = ramp(&[4, 4], 0.5);
        let eye = DenseTensor::identity(4);
        assert_eq!(a.matmul(&eye).unwrap(), a);
    }

    #[test]
    fn test_mat_vec() {
        let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let x = DenseTensor::vector(vec![1.0, 0.0, -1.0]);
        assert_eq!(a.mat_vec(&x).unwrap().data(), &[-2.0, -2.0]);
        assert!(a.mat_vec(&DenseTensor::vector(vec![1.0])).is_err());
    }

    #[test]
    fn test_dot_outer_inner() {
        let a = DenseTensor::vector(vec![1.0, 2.0, 3.0]);
        let b = DenseTensor::vector(vec![4.0, 5.0, 6.0]);
        assert_eq!(a.dot(&b).unwrap(), 32.0);
        let o = a.outer(&b).unwrap();
        assert_eq!(o.dims(), &[3, 3]);
        assert_eq!(o[&[2, 0]], 12.0);

        let z = DenseTensor::vector(vec![Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)]);
        assert_eq!(z.inner(&z).unwrap(), Complex64::new(2.0, 0.0));
    }

    #[test]
    fn test_norm_is_overflow_safe() {
        let big = DenseTensor::vector(vec![3e200, 4e200]);
        assert!((big.norm() / 5e200 - 1.0).abs() < 1e-12);
        assert_eq!(DenseTensor::<f64>::zeros(&[3]).norm(), 0.0);
        let z = DenseTensor::vector(vec![Complex64::new(3.0, 4.0)]);
        assert!((z.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_tensor_dot_matches_matmul() {
        let a = ramp(&[3, 4], 0.2);
        let b = ramp(&[4, 5], 0.7);
        let via_dot = a.tensor_dot(&b, &[1], &[0]).unwrap();
        let via_matmul = a.matmul(&b).unwrap();
        assert_eq!(via_dot.dims(), &[3, 5]);
        for (x, y) in via_dot.data().iter().zip(via_matmul.data()) {
            assert!((x - y).abs() < 1e-10);
        }
    }

    #[test]
    fn test_tensor_dot_shape_law() {
        let a = ramp(&[2, 3, 4], 0.1);
        let b = ramp(&[4, 5, 3], 0.3);
        let c = a.tensor_dot(&b, &[1, 2], &[2, 0]).unwrap();
        assert_eq!(c.dims(), &[2, 5]);

        // c[i, l] = Σ_j Σ_k a[i, j, k] * b[k, l, j]
        for i in 0..2 {
            for l in 0..5 {
                let mut expected = 0.0;
                for j in 0..3 {
                    for k in 0..4 {
                        expected += a[&[i, j, k]] * b[&[k, l, j]];
                    }
                }
                assert!((c[&[i, l]] - expected).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_tensor_dot_errors() {
        let a = ramp(&[2, 3], 0.1);
        let b = ramp(&[4, 2], 0.1);
        assert!(matches!(
            a.tensor_dot(&b, &[1], &[0]),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            a.tensor_dot(&b, &[0, 1], &[1]),
            Err(TensorError::ShapeMismatch { .. })
        ));
        assert!(a.tensor_dot(&b, &[2], &[0]).is_err());
        assert!(a.tensor_dot(&a, &[0, 0], &[0, 1]).is_err());
    }

    #[test]
    fn test_tensor_dot_concurrent_dispatch() {
        let dispatcher = Dispatcher::with_policy(
            KernelConfig::new().block_size(2).cache_capacity(4),
            FixedPolicy::concurrent(),
        )
        .unwrap();
        let a = ramp(&[3, 2, 4], 0.9);
        let b = ramp(&[2, 4, 6], 0.4);
        let par = a.tensor_dot_with(&b, &[1, 2], &[0, 1], &dispatcher).unwrap();
        let seq = a.tensor_dot(&b, &[1, 2], &[0, 1]).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn test_tensor_trace() {
        let m = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let tr = m.tensor_tr(0, 1).unwrap();
        assert_eq!(tr.rank(), 0);
        assert_eq!(tr.data(), &[5.0]);

        let t = ramp(&[3, 2, 3], 1.0);
        let tr = t.tensor_tr(0, 2).unwrap();
        assert_eq!(tr.dims(), &[2]);
        for j in 0..2 {
            let expected: f64 = (0..3).map(|d| t[&[d, j, d]]).sum();
            assert!((tr.data()[j] - expected).abs() < 1e-12);
        }

        assert!(t.tensor_tr(0, 1).is_err());
        assert!(t.tensor_tr(1, 1).is_err());
        assert!(t.tensor_tr(0, 3).is_err());
    }
}
