//! Sparse vectors in coordinate format

use std::borrow::Cow;
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tenalg_core::algebra::arg_extreme;
use tenalg_core::error::ensure_same_shape;
use tenalg_core::{DenseTensor, Ring, Semiring, Shape, TensorError};

use crate::error::{CooError, Result};
use crate::merge;

/// Sparse vector: sorted positions with parallel values.
///
/// # Examples
///
/// ```
/// use tenalg_sparse::CooVector;
///
/// let a = CooVector::new(5, vec![0, 3], vec![1.0, 2.0]).unwrap();
/// let b = CooVector::new(5, vec![3, 4], vec![10.0, 1.0]).unwrap();
/// assert_eq!(a.dot(&b).unwrap(), 20.0);
/// assert_eq!(a.add(&b).unwrap().indices(), &[0, 3, 4]);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CooVector<T> {
    size: usize,
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T> CooVector<T> {
    pub fn new(
        size: usize,
        indices: Vec<usize>,
        values: Vec<T>,
    ) -> std::result::Result<Self, CooError> {
        if indices.len() != values.len() {
            return Err(CooError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        if let Some(&i) = indices.iter().find(|&&i| i >= size) {
            return Err(CooError::IndexOutOfBounds {
                index: vec![i],
                shape: vec![size],
            });
        }
        Ok(Self {
            size,
            indices,
            values,
        })
    }

    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn is_canonical(&self) -> bool {
        merge::is_canonical(&self.indices)
    }

    pub fn sort_indices(&mut self) {
        if self.is_canonical() {
            return;
        }
        let indices = std::mem::take(&mut self.indices);
        let values = std::mem::take(&mut self.values);
        (self.indices, self.values) = merge::sort_by_key(indices, values);
    }
}

impl<T: Semiring> CooVector<T> {
    /// Canonical copy with duplicates summed.
    pub fn coalesce(&self) -> Self {
        let (indices, values) =
            merge::coalesce(self.indices.clone(), self.values.clone(), |a, b| a.add(b));
        Self {
            size: self.size,
            indices,
            values,
        }
    }

    fn canonical(&self) -> Cow<'_, Self> {
        if self.is_canonical() {
            Cow::Borrowed(self)
        } else {
            tracing::debug!(size = self.size, nnz = self.nnz(), "coalescing non-canonical COO vector");
            Cow::Owned(self.coalesce())
        }
    }

    pub fn from_dense(dense: &DenseTensor<T>) -> Result<Self> {
        if dense.rank() != 1 {
            return Err(CooError::InvalidShape(format!(
                "expected a vector, got shape {}",
                dense.shape()
            ))
            .into());
        }
        let (indices, values) = dense
            .data()
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_zero())
            .map(|(i, v)| (i, v.clone()))
            .unzip();
        Ok(Self {
            size: dense.len(),
            indices,
            values,
        })
    }

    /// Dense copy; duplicates are summed.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the dense buffer would exceed the maximum
    /// array size.
    pub fn to_dense(&self) -> Result<DenseTensor<T>> {
        let mut dense = DenseTensor::try_zeros(&Shape::new(&[self.size]))?;
        let data: &mut [T] = dense.data_mut();
        for (&i, v) in self.indices.iter().zip(&self.values) {
            data[i] = data[i].add(v);
        }
        Ok(dense)
    }

    pub fn get(&self, index: usize) -> Result<T> {
        if index >= self.size {
            return Err(TensorError::index_out_of_bounds(&[index], &[self.size]).into());
        }
        if self.is_canonical() {
            return Ok(match merge::search(&self.indices, &index) {
                Ok(pos) => self.values[pos].clone(),
                Err(_) => T::zero(),
            });
        }
        Ok(self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|(&i, _)| i == index)
            .fold(T::zero(), |acc, (_, v)| acc.add(v)))
    }

    fn union_with<FB, FO>(&self, other: &Self, op: &str, both: FB, only_b: FO) -> Result<Self>
    where
        FB: FnMut(&T, &T) -> T,
        FO: FnMut(&T) -> T,
    {
        ensure_same_shape(op, &[self.size], &[other.size])?;
        let (a, b) = (self.canonical(), other.canonical());
        let (indices, values) = merge::merge_union(
            (&a.indices[..], &a.values[..]),
            (&b.indices[..], &b.values[..]),
            both,
            T::clone,
            only_b,
        );
        Ok(Self {
            size: self.size,
            indices,
            values,
        })
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.union_with(other, "add", |x, y| x.add(y), T::clone)
    }

    pub fn elem_mult(&self, other: &Self) -> Result<Self> {
        ensure_same_shape("elem_mult", &[self.size], &[other.size])?;
        let (a, b) = (self.canonical(), other.canonical());
        let (indices, values) = merge::merge_intersection(
            (&a.indices[..], &a.values[..]),
            (&b.indices[..], &b.values[..]),
            |x, y| x.mult(y),
        );
        Ok(Self {
            size: self.size,
            indices,
            values,
        })
    }

    /// Sum of products over positions stored in both vectors.
    pub fn dot(&self, other: &Self) -> Result<T> {
        let product = self.elem_mult(other)?;
        Ok(product
            .values
            .iter()
            .fold(T::zero(), |acc, v| acc.add(v)))
    }

    pub fn mult_scalar(&self, scalar: &T) -> Self {
        Self {
            size: self.size,
            indices: self.indices.clone(),
            values: self.values.iter().map(|v| v.mult(scalar)).collect(),
        }
    }

    pub fn min(&self) -> Option<&T> {
        arg_extreme(&self.values, Ordering::Less).map(|pos| &self.values[pos])
    }

    pub fn max(&self) -> Option<&T> {
        arg_extreme(&self.values, Ordering::Greater).map(|pos| &self.values[pos])
    }

    /// Position of the smallest stored value.
    pub fn argmin(&self) -> Option<usize> {
        arg_extreme(&self.values, Ordering::Less).map(|pos| self.indices[pos])
    }

    /// Position of the largest stored value.
    pub fn argmax(&self) -> Option<usize> {
        arg_extreme(&self.values, Ordering::Greater).map(|pos| self.indices[pos])
    }
}

impl<T: Ring> CooVector<T> {
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.union_with(other, "sub", |x, y| x.sub(y), T::add_inv)
    }

    /// Inner product `Σ a_i · conj(b_i)`.
    pub fn inner(&self, other: &Self) -> Result<T> {
        ensure_same_shape("inner", &[self.size], &[other.size])?;
        let (a, b) = (self.canonical(), other.canonical());
        let (_, products) = merge::merge_intersection(
            (&a.indices[..], &a.values[..]),
            (&b.indices[..], &b.values[..]),
            |x, y| x.mult(&y.conj()),
        );
        Ok(products.iter().fold(T::zero(), |acc, v| acc.add(v)))
    }

    /// Euclidean norm of the stored values.
    pub fn norm(&self) -> f64 {
        self.canonical()
            .values
            .iter()
            .map(|v| v.mag() * v.mag())
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::num_complex::Complex64;

    use crate::error::SparseError;

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            CooVector::new(3, vec![0, 1], vec![1.0]),
            Err(CooError::LengthMismatch { .. })
        ));
        assert!(matches!(
            CooVector::new(3, vec![3], vec![1.0]),
            Err(CooError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_merge_ops_match_dense() {
        let a = CooVector::new(6, vec![4, 0, 2], vec![1.0, 2.0, 3.0]).unwrap();
        let b = CooVector::new(6, vec![2, 5], vec![-1.0, 4.0]).unwrap();
        let (da, db) = (a.to_dense().unwrap(), b.to_dense().unwrap());

        assert_eq!(a.add(&b).unwrap().to_dense().unwrap(), da.add(&db).unwrap());
        assert_eq!(a.sub(&b).unwrap().to_dense().unwrap(), da.sub(&db).unwrap());
        assert_eq!(a.elem_mult(&b).unwrap().to_dense().unwrap(), da.elem_mult(&db).unwrap());
        assert_eq!(a.dot(&b).unwrap(), da.dot(&db).unwrap());
        assert!(a.add(&CooVector::zeros(5)).unwrap_err().is_shape_mismatch());
    }

    #[test]
    fn test_inner_conjugates_right_operand() {
        let a = CooVector::new(2, vec![0], vec![Complex64::new(0.0, 1.0)]).unwrap();
        let b = CooVector::new(2, vec![0, 1], vec![Complex64::new(0.0, 1.0), Complex64::new(1.0, 0.0)])
            .unwrap();
        assert_eq!(a.inner(&b).unwrap(), Complex64::new(1.0, 0.0));
        assert_eq!(a.dot(&b).unwrap(), Complex64::new(-1.0, 0.0));
    }

    #[test]
    fn test_get_and_sort() {
        let mut v = CooVector::new(4, vec![3, 1, 3], vec![1.0, 2.0, 5.0]).unwrap();
        assert_eq!(v.get(3).unwrap(), 6.0);
        assert_eq!(v.get(0).unwrap(), 0.0);
        assert!(v.get(4).is_err());
        v.sort_indices();
        assert_eq!(v.indices(), &[1, 3, 3]);
        assert_eq!(v.coalesce().values(), &[2.0, 6.0]);
    }

    #[test]
    fn test_to_dense_overflow() {
        let v = CooVector::new(usize::MAX, vec![0], vec![1.0]).unwrap();
        assert!(matches!(
            v.to_dense(),
            Err(SparseError::Tensor(TensorError::ArithmeticOverflow(_)))
        ));
    }

    #[test]
    fn test_dense_round_trip_and_reductions() {
        let dense = DenseTensor::vector(vec![0.0, -3.0, 0.0, 8.0]);
        let v = CooVector::from_dense(&dense).unwrap();
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.to_dense().unwrap(), dense);
        assert_eq!(v.argmax(), Some(3));
        assert_eq!(v.argmin(), Some(1));
        assert!((v.norm() - 73f64.sqrt()).abs() < 1e-12);
        assert!(CooVector::from_dense(&DenseTensor::<f64>::zeros(&[2, 2])).is_err());
    }
}
