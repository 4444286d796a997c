//! Structural and numerical predicates on dense tensors
//!
//! Closeness follows the usual mixed tolerance: two entries `a` and `b` are
//! close when `|a - b| <= abs_tol + rel_tol * |b|`. The defaults are
//! [`DEFAULT_REL_TOL`] and [`DEFAULT_ABS_TOL`].

use crate::algebra::{Ring, Semiring};
use crate::error::{Result, TensorError};

use super::types::DenseTensor;

pub const DEFAULT_REL_TOL: f64 = 1e-5;
pub const DEFAULT_ABS_TOL: f64 = 1e-8;

/// Whether `a` and `b` are within `abs_tol + rel_tol * |b|` of each other.
#[inline]
pub fn close<T: Ring>(a: &T, b: &T, rel_tol: f64, abs_tol: f64) -> bool {
    a.sub(b).mag() <= abs_tol + rel_tol * b.mag()
}

fn check_tolerances(rel_tol: f64, abs_tol: f64) -> Result<()> {
    if rel_tol < 0.0 || abs_tol < 0.0 || rel_tol.is_nan() || abs_tol.is_nan() {
        return Err(TensorError::invalid_argument(format!(
            "tolerances must be non-negative, got rel_tol={} abs_tol={}",
            rel_tol, abs_tol
        )));
    }
    Ok(())
}

impl<T: Semiring> DenseTensor<T> {
    /// Whether every entry is the additive identity.
    pub fn is_zeros(&self) -> bool {
        self.data.iter().all(Semiring::is_zero)
    }

    /// Whether every entry is the multiplicative identity.
    pub fn is_ones(&self) -> bool {
        self.data.iter().all(Semiring::is_one)
    }

    /// Whether this is a square matrix equal to its transpose.
    pub fn is_symmetric(&self) -> bool {
        self.is_square_with(|a, b| a == b)
    }

    /// Whether this is the identity matrix.
    pub fn is_identity(&self) -> bool {
        match self.shape.matrix_dims() {
            Ok((n, m)) if n == m => self.data.iter().enumerate().all(|(flat, x)| {
                if flat / n == flat % n {
                    x.is_one()
                } else {
                    x.is_zero()
                }
            }),
            _ => false,
        }
    }

    /// Square matrix check: `pred(a[i, j], a[j, i])` for every `i < j`,
    /// plus `pred(a[i, i], a[i, i])` on the diagonal.
    fn is_square_with<F>(&self, pred: F) -> bool
    where
        F: Fn(&T, &T) -> bool,
    {
        let n = match self.shape.matrix_dims() {
            Ok((rows, cols)) if rows == cols => rows,
            _ => return false,
        };
        (0..n).all(|i| (i..n).all(|j| pred(&self.data[i * n + j], &self.data[j * n + i])))
    }
}

impl<T: Ring> DenseTensor<T> {
    /// [`DenseTensor::all_close_tol`] with the default tolerances.
    pub fn all_close(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| close(a, b, DEFAULT_REL_TOL, DEFAULT_ABS_TOL))
    }

    /// Whether both tensors have the same shape and every pair of entries is
    /// close under the given tolerances.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidArgument`] if a tolerance is negative or NaN.
    pub fn all_close_tol(&self, other: &Self, rel_tol: f64, abs_tol: f64) -> Result<bool> {
        check_tolerances(rel_tol, abs_tol)?;
        Ok(self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| close(a, b, rel_tol, abs_tol)))
    }

    /// Whether this is a square matrix equal to its conjugate transpose.
    pub fn is_hermitian(&self) -> bool {
        self.is_square_with(|a, b| *a == b.conj())
    }

    /// Whether this is a square matrix close to its conjugate transpose.
    pub fn is_close_to_hermitian(&self) -> bool {
        self.is_square_with(|a, b| close(a, &b.conj(), DEFAULT_REL_TOL, DEFAULT_ABS_TOL))
    }

    /// Whether this is a square matrix close to the identity.
    pub fn is_close_to_identity(&self) -> bool {
        match self.shape.matrix_dims() {
            Ok((n, m)) if n == m => self.data.iter().enumerate().all(|(flat, x)| {
                let target = if flat / n == flat % n {
                    T::one()
                } else {
                    T::zero()
                };
                close(x, &target, DEFAULT_REL_TOL, DEFAULT_ABS_TOL)
            }),
            _ => false,
        }
    }

    /// Whether every entry is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(Ring::is_finite)
    }

    /// Whether any entry is NaN.
    pub fn is_nan(&self) -> bool {
        self.data.iter().any(Ring::is_nan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::num_complex::Complex64;

    #[test]
    fn test_all_close_tolerances() {
        let a = DenseTensor::vector(vec![1.0, 100.0]);
        let b = DenseTensor::vector(vec![1.0 + 1e-9, 100.0 + 5e-4]);
        assert!(a.all_close(&b));
        let c = DenseTensor::vector(vec![1.0, 100.1]);
        assert!(!a.all_close(&c));
        assert!(a.all_close_tol(&c, 1e-2, 0.0).unwrap());
        assert!(a.all_close_tol(&c, -1.0, 0.0).is_err());
        assert!(a.all_close_tol(&c, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_all_close_requires_same_shape() {
        let a = DenseTensor::<f64>::zeros(&[2, 3]);
        let b = DenseTensor::<f64>::zeros(&[3, 2]);
        assert!(!a.all_close(&b));
    }

    #[test]
    fn test_symmetric_and_hermitian() {
        let s = DenseTensor::from_vec(vec![1.0, 2.0, 2.0, 3.0], &[2, 2]).unwrap();
        assert!(s.is_symmetric());
        assert!(s.is_hermitian());
        let n = DenseTensor::from_vec(vec![1.0, 2.0, 0.0, 3.0], &[2, 2]).unwrap();
        assert!(!n.is_symmetric());
        assert!(!DenseTensor::<f64>::zeros(&[2, 3]).is_symmetric());

        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        let h = DenseTensor::from_vec(vec![one, i, -i, one], &[2, 2]).unwrap();
        assert!(h.is_hermitian());
        assert!(!h.is_symmetric());
        let drifted = DenseTensor::from_vec(
            vec![one, i, Complex64::new(1e-12, -1.0), one],
            &[2, 2],
        )
        .unwrap();
        assert!(!drifted.is_hermitian());
        assert!(drifted.is_close_to_hermitian());
    }

    #[test]
    fn test_identity_checks() {
        let eye = DenseTensor::<f64>::identity(3);
        assert!(eye.is_identity());
        assert!(eye.is_close_to_identity());
        let mut near = eye.clone();
        near[&[0, 2]] = 1e-12;
        assert!(!near.is_identity());
        assert!(near.is_close_to_identity());
        assert!(!DenseTensor::<f64>::ones(&[1, 2]).is_close_to_identity());
    }

    #[test]
    fn test_zeros_ones_finite() {
        assert!(DenseTensor::<i64>::zeros(&[4]).is_zeros());
        assert!(DenseTensor::<i64>::ones(&[4]).is_ones());
        assert!(DenseTensor::<f64>::zeros(&[0]).is_zeros());
        let t = DenseTensor::vector(vec![1.0, f64::INFINITY]);
        assert!(!t.is_finite());
        assert!(!t.is_nan());
        assert!(DenseTensor::vector(vec![f64::NAN]).is_nan());
    }
}
