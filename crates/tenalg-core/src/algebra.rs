//! Algebraic element traits
//!
//! Every kernel in tenalg is generic over one of three capability traits:
//!
//! - [`Semiring`]: addition, multiplication, both identities and an ordering
//! - [`Ring`]: adds subtraction, additive inverse, conjugation and magnitude
//! - [`Field`]: adds multiplicative inverse and division
//!
//! The identities are associated functions of the element type, so a sparse
//! tensor never has to derive its zero from a stored entry.
//!
//! Implementations are provided for `f32`, `f64`, `Complex<f32>`,
//! `Complex<f64>` (fields), `i32`, `i64` (rings, wrapping arithmetic) and
//! `bool` (the Boolean semiring with `or` as addition and `and` as
//! multiplication). User types plug in by implementing the traits.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::{Field, Ring, Semiring};
//! use scirs2_core::num_complex::Complex64;
//!
//! let z = Complex64::new(3.0, 4.0);
//! assert_eq!(Ring::mag(&z), 5.0);
//! assert_eq!(Ring::conj(&z), Complex64::new(3.0, -4.0));
//! assert!(Field::div(&z, &z).is_one());
//! assert!(<f64 as Semiring>::zero().is_zero());
//! ```

use std::cmp::Ordering;
use std::fmt::Debug;

use scirs2_core::num_complex::Complex;

/// Element type supporting addition and multiplication with identities.
///
/// `add` must be associative and commutative with identity [`Semiring::zero`];
/// `mult` must be associative with identity [`Semiring::one`] and distribute
/// over `add`. `compare` supplies the total order used by `min`/`max`
/// reductions.
pub trait Semiring: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    fn add(&self, rhs: &Self) -> Self;

    fn mult(&self, rhs: &Self) -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn is_one(&self) -> bool {
        *self == Self::one()
    }

    fn compare(&self, rhs: &Self) -> Ordering;
}

/// Semiring with additive inverses, conjugation and a magnitude.
pub trait Ring: Semiring {
    fn add_inv(&self) -> Self;

    fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.add_inv())
    }

    /// Complex conjugate; the identity for real and integer types.
    fn conj(&self) -> Self {
        self.clone()
    }

    /// Absolute value (modulus for complex numbers) as `f64`.
    fn mag(&self) -> f64;

    fn is_finite(&self) -> bool {
        true
    }

    fn is_nan(&self) -> bool {
        false
    }
}

/// Ring with multiplicative inverses.
///
/// Division by zero is not an error: floating-point fields return their
/// infinity/NaN representation.
pub trait Field: Ring {
    fn mult_inv(&self) -> Self;

    fn div(&self, rhs: &Self) -> Self {
        self.mult(&rhs.mult_inv())
    }
}

/// Sum a sequence of semiring elements, starting from zero.
pub fn semiring_sum<'a, T: Semiring>(values: impl IntoIterator<Item = &'a T>) -> T {
    values
        .into_iter()
        .fold(T::zero(), |acc, value| acc.add(value))
}

/// Position of the first element that wins every comparison under `wins`.
///
/// `Ordering::Less` finds the minimum, `Ordering::Greater` the maximum; ties
/// go to the earliest position. `None` for an empty slice.
pub fn arg_extreme<T: Semiring>(values: &[T], wins: Ordering) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (pos, value) in values.iter().enumerate() {
        match best {
            Some(b) if value.compare(&values[b]) != wins => {}
            _ => best = Some(pos),
        }
    }
    best
}

macro_rules! impl_real_field {
    ($($t:ty),*) => {$(
        impl Semiring for $t {
            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }

            #[inline]
            fn add(&self, rhs: &Self) -> Self {
                *self + *rhs
            }

            #[inline]
            fn mult(&self, rhs: &Self) -> Self {
                *self * *rhs
            }

            #[inline]
            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn compare(&self, rhs: &Self) -> Ordering {
                self.total_cmp(rhs)
            }
        }

        impl Ring for $t {
            #[inline]
            fn add_inv(&self) -> Self {
                -*self
            }

            #[inline]
            fn sub(&self, rhs: &Self) -> Self {
                *self - *rhs
            }

            #[inline]
            fn mag(&self) -> f64 {
                (*self as f64).abs()
            }

            fn is_finite(&self) -> bool {
                <$t>::is_finite(*self)
            }

            fn is_nan(&self) -> bool {
                <$t>::is_nan(*self)
            }
        }

        impl Field for $t {
            #[inline]
            fn mult_inv(&self) -> Self {
                1.0 / *self
            }

            #[inline]
            fn div(&self, rhs: &Self) -> Self {
                *self / *rhs
            }
        }
    )*};
}

macro_rules! impl_complex_field {
    ($($t:ty),*) => {$(
        impl Semiring for Complex<$t> {
            #[inline]
            fn zero() -> Self {
                Complex::new(0.0, 0.0)
            }

            #[inline]
            fn one() -> Self {
                Complex::new(1.0, 0.0)
            }

            #[inline]
            fn add(&self, rhs: &Self) -> Self {
                *self + *rhs
            }

            #[inline]
            fn mult(&self, rhs: &Self) -> Self {
                *self * *rhs
            }

            /// Complex numbers are ordered by magnitude.
            fn compare(&self, rhs: &Self) -> Ordering {
                Ring::mag(self).total_cmp(&Ring::mag(rhs))
            }
        }

        impl Ring for Complex<$t> {
            #[inline]
            fn add_inv(&self) -> Self {
                -*self
            }

            #[inline]
            fn sub(&self, rhs: &Self) -> Self {
                *self - *rhs
            }

            #[inline]
            fn conj(&self) -> Self {
                Complex::new(self.re, -self.im)
            }

            fn mag(&self) -> f64 {
                (self.re as f64).hypot(self.im as f64)
            }

            fn is_finite(&self) -> bool {
                self.re.is_finite() && self.im.is_finite()
            }

            fn is_nan(&self) -> bool {
                self.re.is_nan() || self.im.is_nan()
            }
        }

        impl Field for Complex<$t> {
            #[inline]
            fn mult_inv(&self) -> Self {
                Complex::new(1.0, 0.0) / *self
            }

            #[inline]
            fn div(&self, rhs: &Self) -> Self {
                *self / *rhs
            }
        }
    )*};
}

macro_rules! impl_integer_ring {
    ($($t:ty),*) => {$(
        impl Semiring for $t {
            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }

            #[inline]
            fn add(&self, rhs: &Self) -> Self {
                self.wrapping_add(*rhs)
            }

            #[inline]
            fn mult(&self, rhs: &Self) -> Self {
                self.wrapping_mul(*rhs)
            }

            fn compare(&self, rhs: &Self) -> Ordering {
                self.cmp(rhs)
            }
        }

        impl Ring for $t {
            #[inline]
            fn add_inv(&self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn sub(&self, rhs: &Self) -> Self {
                self.wrapping_sub(*rhs)
            }

            fn mag(&self) -> f64 {
                (*self as f64).abs()
            }
        }
    )*};
}

impl_real_field!(f32, f64);
impl_complex_field!(f32, f64);
impl_integer_ring!(i32, i64);

impl Semiring for bool {
    fn zero() -> Self {
        false
    }

    fn one() -> Self {
        true
    }

    fn add(&self, rhs: &Self) -> Self {
        *self || *rhs
    }

    fn mult(&self, rhs: &Self) -> Self {
        *self && *rhs
    }

    fn compare(&self, rhs: &Self) -> Ordering {
        self.cmp(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scirs2_core::num_complex::Complex64;

    #[test]
    fn test_real_identities() {
        assert_eq!(<f64 as Semiring>::zero(), 0.0);
        assert_eq!(<f64 as Semiring>::one(), 1.0);
        assert!(Semiring::is_zero(&-0.0f64));
        assert!(Semiring::is_one(&1.0f32));
    }

    #[test]
    fn test_real_division_by_zero_propagates() {
        let inf = Field::div(&1.0f64, &0.0);
        assert!(!Ring::is_finite(&inf));
        let nan = Field::div(&0.0f64, &0.0);
        assert!(Ring::is_nan(&nan));
    }

    #[test]
    fn test_complex_ops() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, -1.0);
        assert_eq!(Semiring::add(&a, &b), Complex64::new(4.0, 1.0));
        assert_eq!(Semiring::mult(&a, &b), Complex64::new(5.0, 5.0));
        assert_eq!(Ring::sub(&a, &b), Complex64::new(-2.0, 3.0));
        assert_eq!(Ring::add_inv(&a), Complex64::new(-1.0, -2.0));

        let q = Field::div(&a, &b);
        let back = Semiring::mult(&q, &b);
        assert!((back.re - a.re).abs() < 1e-12);
        assert!((back.im - a.im).abs() < 1e-12);
    }

    #[test]
    fn test_complex_compare_by_magnitude() {
        let small = Complex64::new(0.0, 1.0);
        let large = Complex64::new(-2.0, 0.0);
        assert_eq!(Semiring::compare(&small, &large), Ordering::Less);
        assert_eq!(
            Semiring::compare(&Complex64::new(3.0, 4.0), &Complex64::new(5.0, 0.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_integer_ring() {
        assert_eq!(Ring::sub(&3i64, &5), -2);
        assert_eq!(Ring::add_inv(&7i32), -7);
        assert_eq!(Ring::mag(&-4i32), 4.0);
        assert_eq!(Ring::conj(&9i64), 9);
    }

    #[test]
    fn test_boolean_semiring() {
        assert!(Semiring::add(&true, &false));
        assert!(!Semiring::mult(&true, &false));
        assert!(Semiring::is_zero(&false));
        assert!(Semiring::is_one(&true));
    }

    #[test]
    fn test_semiring_sum() {
        let values = [1.0, 2.0, 3.5];
        assert_eq!(semiring_sum(&values), 6.5);
        let empty: [i32; 0] = [];
        assert_eq!(semiring_sum(&empty), 0);
    }
}
