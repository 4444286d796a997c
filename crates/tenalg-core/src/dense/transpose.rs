//! Transpose kernels for dense tensors
//!
//! Two families of kernels exist:
//!
//! - **Tensor permutations** (any rank): each destination entry is located
//!   by converting a flat index to a multi-index, permuting the coordinates
//!   and converting back. The concurrent variant walks destination ranges
//!   and maps each one back to its source.
//! - **Matrix transposes** (rank 2): a direct strided loop and a
//!   cache-blocked loop over `block_size × block_size` tiles, each with a
//!   concurrent form that splits destination rows over the worker pool.
//!
//! Every kernel takes an element map so the Hermitian transpose is the same
//! code with conjugation plugged in. All variants produce identical output.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::DenseTensor;
//! use tenalg_core::dispatch::TransposeAlgorithm;
//!
//! let m = DenseTensor::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap();
//! let t = m.transpose().unwrap();
//! assert_eq!(t.dims(), &[3, 2]);
//! assert_eq!(t.data(), &[1, 4, 2, 5, 3, 6]);
//!
//! let blocked = m.transpose_using(TransposeAlgorithm::Blocked, 2).unwrap();
//! assert_eq!(blocked, t);
//! ```

use crate::algebra::Ring;
use crate::dispatch::{Dispatcher, TransposeAlgorithm};
use crate::error::{ensure_axis, Result, TensorError};
use crate::parallel::{run_blocked_partitioned, run_partitioned};
use crate::shape::{ensure_permutation, Shape};

use super::types::DenseTensor;

/// Permute `src` (of shape `shape`) into `dest` so that destination axis `k`
/// is source axis `perm[k]`.
pub fn permute_into<T, F>(src: &[T], shape: &Shape, perm: &[usize], dest: &mut [T], f: F)
where
    F: Fn(&T) -> T,
{
    let dest_shape = permuted_shape(shape, perm);
    let rank = shape.rank();
    let mut src_index = vec![0; rank];
    let mut dest_index = vec![0; rank];
    for (flat, value) in src.iter().enumerate() {
        shape.nd_index_into(flat, &mut src_index);
        for k in 0..rank {
            dest_index[k] = src_index[perm[k]];
        }
        dest[dest_shape.flat_index_unchecked(&dest_index)] = f(value);
    }
}

/// Concurrent [`permute_into`]: destination ranges are mapped back to their sources.
pub fn permute_concurrent_into<T, F>(src: &[T], shape: &Shape, perm: &[usize], dest: &mut [T], f: F)
where
    T: Send + Sync,
    F: Fn(&T) -> T + Send + Sync,
{
    if dest.is_empty() {
        return;
    }
    let dest_shape = permuted_shape(shape, perm);
    let rank = shape.rank();
    run_partitioned(dest, 1, |range, chunk| {
        let mut src_index = vec![0; rank];
        let mut dest_index = vec![0; rank];
        for (slot, flat) in chunk.iter_mut().zip(range) {
            dest_shape.nd_index_into(flat, &mut dest_index);
            for k in 0..rank {
                src_index[perm[k]] = dest_index[k];
            }
            *slot = f(&src[shape.flat_index_unchecked(&src_index)]);
        }
    });
}

fn permuted_shape(shape: &Shape, perm: &[usize]) -> Shape {
    let dims: Vec<usize> = perm.iter().map(|&p| shape.dims()[p]).collect();
    Shape::new(&dims)
}

/// Transpose a `rows × cols` row-major matrix into `dest` (`cols × rows`).
pub fn standard_matrix_into<T, F>(src: &[T], rows: usize, cols: usize, dest: &mut [T], f: F)
where
    F: Fn(&T) -> T,
{
    for i in 0..rows {
        for j in 0..cols {
            dest[j * rows + i] = f(&src[i * cols + j]);
        }
    }
}

/// Cache-blocked matrix transpose over `block_size × block_size` tiles.
pub fn blocked_matrix_into<T, F>(
    src: &[T],
    rows: usize,
    cols: usize,
    block_size: usize,
    dest: &mut [T],
    f: F,
) where
    F: Fn(&T) -> T,
{
    let bs = block_size.max(1);
    for ii in (0..rows).step_by(bs) {
        let i_end = (ii + bs).min(rows);
        for jj in (0..cols).step_by(bs) {
            let j_end = (jj + bs).min(cols);
            for i in ii..i_end {
                for j in jj..j_end {
                    dest[j * rows + i] = f(&src[i * cols + j]);
                }
            }
        }
    }
}

/// [`standard_matrix_into`] with destination rows split over the worker pool.
pub fn standard_matrix_concurrent_into<T, F>(
    src: &[T],
    rows: usize,
    cols: usize,
    dest: &mut [T],
    f: F,
) where
    T: Send + Sync,
    F: Fn(&T) -> T + Send + Sync,
{
    if dest.is_empty() {
        return;
    }
    run_partitioned(dest, rows, |dest_rows, chunk| {
        for (local, j) in dest_rows.enumerate() {
            for i in 0..rows {
                chunk[local * rows + i] = f(&src[i * cols + j]);
            }
        }
    });
}

/// [`blocked_matrix_into`] with block-aligned destination row ranges on the worker pool.
pub fn blocked_matrix_concurrent_into<T, F>(
    src: &[T],
    rows: usize,
    cols: usize,
    block_size: usize,
    dest: &mut [T],
    f: F,
) where
    T: Send + Sync,
    F: Fn(&T) -> T + Send + Sync,
{
    if dest.is_empty() {
        return;
    }
    let bs = block_size.max(1);
    run_blocked_partitioned(dest, rows, bs, |dest_rows, chunk| {
        let base = dest_rows.start;
        for jj in dest_rows.clone().step_by(bs) {
            let j_end = (jj + bs).min(dest_rows.end);
            for ii in (0..rows).step_by(bs) {
                let i_end = (ii + bs).min(rows);
                for j in jj..j_end {
                    for i in ii..i_end {
                        chunk[(j - base) * rows + i] = f(&src[i * cols + j]);
                    }
                }
            }
        }
    });
}

/// Run one of the four matrix kernels.
fn matrix_kernel<T, F>(
    src: &[T],
    rows: usize,
    cols: usize,
    algorithm: TransposeAlgorithm,
    block_size: usize,
    f: F,
) -> Vec<T>
where
    T: Clone + Send + Sync,
    F: Fn(&T) -> T + Send + Sync,
{
    let mut dest = src.to_vec();
    match algorithm {
        TransposeAlgorithm::Standard => standard_matrix_into(src, rows, cols, &mut dest, f),
        TransposeAlgorithm::Blocked => {
            blocked_matrix_into(src, rows, cols, block_size, &mut dest, f)
        }
        TransposeAlgorithm::ConcurrentStandard => {
            standard_matrix_concurrent_into(src, rows, cols, &mut dest, f)
        }
        TransposeAlgorithm::ConcurrentBlocked => {
            blocked_matrix_concurrent_into(src, rows, cols, block_size, &mut dest, f)
        }
    }
    dest
}

impl<T: Clone + Send + Sync> DenseTensor<T> {
    fn permute_impl<F>(
        &self,
        perm: &[usize],
        hermitian: bool,
        dispatcher: &Dispatcher,
        f: F,
    ) -> Result<Self>
    where
        F: Fn(&T) -> T + Send + Sync,
    {
        ensure_permutation(perm, self.rank())?;
        let dest_shape = self.shape.permute_axes(perm)?;

        // A rank-2 swap is a matrix transpose.
        if self.rank() == 2 && perm == [1, 0] {
            let (rows, cols) = self.matrix_dims()?;
            let algorithm = dispatcher.transpose(&self.shape, &dest_shape, hermitian);
            let data = matrix_kernel(&self.data, rows, cols, algorithm, dispatcher.block_size(), f);
            return Ok(Self {
                shape: dest_shape,
                data,
            });
        }

        let mut data = self.data.clone();
        if perm.iter().enumerate().all(|(k, &p)| k == p) {
            data.iter_mut().for_each(|x| *x = f(x));
        } else if dispatcher
            .transpose(&self.shape, &dest_shape, hermitian)
            .is_concurrent()
        {
            permute_concurrent_into(&self.data, &self.shape, perm, &mut data, f);
        } else {
            permute_into(&self.data, &self.shape, perm, &mut data, f);
        }
        Ok(Self {
            shape: dest_shape,
            data,
        })
    }

    fn swap_perm(&self, axis1: usize, axis2: usize) -> Result<Vec<usize>> {
        ensure_axis(axis1, self.rank())?;
        ensure_axis(axis2, self.rank())?;
        let mut perm: Vec<usize> = (0..self.rank()).collect();
        perm.swap(axis1, axis2);
        Ok(perm)
    }

    /// Transpose: swap the first and last axes.
    ///
    /// For a matrix this is the usual transpose. Rank-0 and rank-1 tensors
    /// are returned unchanged.
    pub fn transpose(&self) -> Result<Self> {
        if self.rank() < 2 {
            return Ok(self.clone());
        }
        self.transpose_axes(0, self.rank() - 1)
    }

    /// Swap two axes.
    ///
    /// # Errors
    ///
    /// [`TensorError::AxisOutOfBounds`] if either axis is not smaller than the rank.
    pub fn transpose_axes(&self, axis1: usize, axis2: usize) -> Result<Self> {
        self.transpose_axes_with(axis1, axis2, Dispatcher::global())
    }

    pub fn transpose_axes_with(
        &self,
        axis1: usize,
        axis2: usize,
        dispatcher: &Dispatcher,
    ) -> Result<Self> {
        let perm = self.swap_perm(axis1, axis2)?;
        self.permute_impl(&perm, false, dispatcher, T::clone)
    }

    /// Reorder axes: result axis `k` is axis `axes[k]` of `self`.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidArgument`] if `axes` is not a permutation of `0..rank`.
    pub fn permute(&self, axes: &[usize]) -> Result<Self> {
        self.permute_with(axes, Dispatcher::global())
    }

    pub fn permute_with(&self, axes: &[usize], dispatcher: &Dispatcher) -> Result<Self> {
        self.permute_impl(axes, false, dispatcher, T::clone)
    }

    /// Matrix transpose with an explicitly chosen kernel.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidArgument`] if `self` is not a matrix or
    /// `block_size` is zero.
    pub fn transpose_using(&self, algorithm: TransposeAlgorithm, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(TensorError::invalid_argument("block size must be positive"));
        }
        let (rows, cols) = self.matrix_dims()?;
        Ok(Self {
            shape: Shape::matrix(cols, rows),
            data: matrix_kernel(&self.data, rows, cols, algorithm, block_size, T::clone),
        })
    }
}

impl<T: Ring> DenseTensor<T> {
    /// Conjugate transpose: swap the first and last axes and conjugate.
    pub fn herm_transpose(&self) -> Result<Self> {
        if self.rank() < 2 {
            return Ok(self.conj());
        }
        self.herm_transpose_axes(0, self.rank() - 1)
    }

    /// Swap two axes and conjugate every entry.
    pub fn herm_transpose_axes(&self, axis1: usize, axis2: usize) -> Result<Self> {
        self.herm_transpose_axes_with(axis1, axis2, Dispatcher::global())
    }

    pub fn herm_transpose_axes_with(
        &self,
        axis1: usize,
        axis2: usize,
        dispatcher: &Dispatcher,
    ) -> Result<Self> {
        let perm = self.swap_perm(axis1, axis2)?;
        self.permute_impl(&perm, true, dispatcher, T::conj)
    }

    /// Permute axes and conjugate every entry.
    pub fn herm_permute(&self, axes: &[usize]) -> Result<Self> {
        self.permute_impl(axes, true, Dispatcher::global(), T::conj)
    }

    /// Conjugate matrix transpose with an explicitly chosen kernel.
    pub fn herm_transpose_using(
        &self,
        algorithm: TransposeAlgorithm,
        block_size: usize,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(TensorError::invalid_argument("block size must be positive"));
        }
        let (rows, cols) = self.matrix_dims()?;
        Ok(Self {
            shape: Shape::matrix(cols, rows),
            data: matrix_kernel(&self.data, rows, cols, algorithm, block_size, T::conj),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::dispatch::FixedPolicy;
    use scirs2_core::num_complex::Complex64;

    const ALGORITHMS: [TransposeAlgorithm; 4] = [
        TransposeAlgorithm::Standard,
        TransposeAlgorithm::Blocked,
        TransposeAlgorithm::ConcurrentStandard,
        TransposeAlgorithm::ConcurrentBlocked,
    ];

    fn ramp(dims: &[usize]) -> DenseTensor<f64> {
        let n: usize = dims.iter().product();
        DenseTensor::from_vec((0..n).map(|x| x as f64).collect(), dims).unwrap()
    }

    #[test]
    fn test_all_matrix_kernels_agree() {
        for &(rows, cols) in &[(1, 1), (3, 7), (17, 5), (64, 65), (0, 4)] {
            let m = ramp(&[rows, cols]);
            let expected = m.transpose_using(TransposeAlgorithm::Standard, 1).unwrap();
            for bs in [1, 3, 8, 64] {
                for algorithm in ALGORITHMS {
                    assert_eq!(
                        m.transpose_using(algorithm, bs).unwrap(),
                        expected,
                        "{:?} with block size {} on {}x{}",
                        algorithm,
                        bs,
                        rows,
                        cols
                    );
                }
            }
        }
    }

    #[test]
    fn test_matrix_transpose_values() {
        let m = ramp(&[2, 3]);
        let t = m.transpose().unwrap();
        assert_eq!(t.dims(), &[3, 2]);
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(m[&[i, j]], t[&[j, i]]);
            }
        }
    }

    #[test]
    fn test_tensor_swap_axes() {
        let t = ramp(&[2, 3, 4]);
        let s = t.transpose_axes(0, 2).unwrap();
        assert_eq!(s.dims(), &[4, 3, 2]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(t[&[i, j, k]], s[&[k, j, i]]);
                }
            }
        }
        assert_eq!(t.transpose_axes(1, 1).unwrap(), t);
        assert!(t.transpose_axes(0, 3).is_err());
    }

    #[test]
    fn test_permute() {
        let t = ramp(&[2, 3, 4]);
        let p = t.permute(&[1, 2, 0]).unwrap();
        assert_eq!(p.dims(), &[3, 4, 2]);
        assert_eq!(t[&[1, 2, 3]], p[&[2, 3, 1]]);
        assert!(matches!(
            t.permute(&[0, 0, 1]),
            Err(TensorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_concurrent_permute_matches_sequential() {
        let config = KernelConfig::new().block_size(4).cache_capacity(4);
        let seq = Dispatcher::with_policy(config.clone(), FixedPolicy::sequential()).unwrap();
        let par = Dispatcher::with_policy(config, FixedPolicy::concurrent()).unwrap();
        let t = ramp(&[3, 5, 2, 4]);
        assert_eq!(
            t.permute_with(&[3, 1, 0, 2], &seq).unwrap(),
            t.permute_with(&[3, 1, 0, 2], &par).unwrap()
        );
        assert_eq!(
            t.transpose_axes_with(1, 3, &seq).unwrap(),
            t.transpose_axes_with(1, 3, &par).unwrap()
        );
        let m = ramp(&[9, 13]);
        assert_eq!(
            m.transpose_axes_with(0, 1, &seq).unwrap(),
            m.transpose_axes_with(0, 1, &par).unwrap()
        );
    }

    #[test]
    fn test_hermitian_transpose() {
        let m = DenseTensor::from_vec(
            vec![
                Complex64::new(1.0, 1.0),
                Complex64::new(2.0, -1.0),
                Complex64::new(0.0, 3.0),
                Complex64::new(4.0, 0.0),
            ],
            &[2, 2],
        )
        .unwrap();
        let h = m.herm_transpose().unwrap();
        assert_eq!(h[&[0, 1]], Complex64::new(0.0, -3.0));
        assert_eq!(h[&[1, 0]], Complex64::new(2.0, 1.0));
        assert_eq!(h.herm_transpose().unwrap(), m);

        for algorithm in ALGORITHMS {
            assert_eq!(m.herm_transpose_using(algorithm, 1).unwrap(), h);
        }
    }

    #[test]
    fn test_vector_transpose_is_identity() {
        let v = ramp(&[5]);
        assert_eq!(v.transpose().unwrap(), v);
    }

    #[test]
    fn test_transpose_using_rejects_non_matrix() {
        let t = ramp(&[2, 2, 2]);
        assert!(t.transpose_using(TransposeAlgorithm::Standard, 4).is_err());
        assert!(ramp(&[2, 2])
            .transpose_using(TransposeAlgorithm::Blocked, 0)
            .is_err());
    }
}
