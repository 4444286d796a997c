//! Property-based tests for shapes and dense kernels
//!
//! Uses proptest to check algebraic laws over randomly generated shapes and
//! small-integer data, so that floating-point sums are exact.

#[cfg(test)]
mod tests {
    use crate::{DenseTensor, Dispatcher, FixedPolicy, KernelConfig, MatMulAlgorithm, Shape};
    use proptest::prelude::*;

    fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 1..=4)
    }

    fn tensor_strategy() -> impl Strategy<Value = DenseTensor<f64>> {
        shape_strategy().prop_flat_map(|dims| {
            let n: usize = dims.iter().product();
            prop::collection::vec(-50i32..50, n).prop_map(move |values| {
                DenseTensor::from_vec(values.into_iter().map(f64::from).collect(), &dims)
                    .expect("length matches shape")
            })
        })
    }

    fn matrix_pair_strategy() -> impl Strategy<Value = (DenseTensor<f64>, DenseTensor<f64>)> {
        (1usize..9, 1usize..9, 1usize..9).prop_flat_map(|(m, k, n)| {
            (
                prop::collection::vec(-20i32..20, m * k),
                prop::collection::vec(-20i32..20, k * n),
            )
                .prop_map(move |(a, b)| {
                    (
                        DenseTensor::matrix(m, k, a.into_iter().map(f64::from).collect())
                            .expect("valid matrix"),
                        DenseTensor::matrix(k, n, b.into_iter().map(f64::from).collect())
                            .expect("valid matrix"),
                    )
                })
        })
    }

    fn concurrent() -> Dispatcher {
        Dispatcher::with_policy(
            KernelConfig::new().block_size(3).cache_capacity(4),
            FixedPolicy::concurrent(),
        )
        .expect("valid config")
    }

    proptest! {
        #[test]
        fn prop_flat_index_round_trip(dims in shape_strategy(), seed in any::<usize>()) {
            let shape = Shape::new(&dims);
            let flat = seed % shape.total_entries();
            let index = shape.nd_index(flat).unwrap();
            prop_assert_eq!(shape.flat_index(&index).unwrap(), flat);
        }

        #[test]
        fn prop_add_commutes(t in tensor_strategy()) {
            let u = t.mult_scalar(&3.0).add_scalar(&1.0);
            prop_assert_eq!(t.add(&u).unwrap(), u.add(&t).unwrap());
        }

        #[test]
        fn prop_sub_self_is_zero(t in tensor_strategy()) {
            prop_assert!(t.sub(&t).unwrap().is_zeros());
        }

        #[test]
        fn prop_concurrent_elementwise_matches_sequential(t in tensor_strategy()) {
            let dispatcher = concurrent();
            let u = t.add_scalar(&2.0);
            prop_assert_eq!(t.add_with(&u, &dispatcher).unwrap(), t.add(&u).unwrap());
            prop_assert_eq!(t.elem_mult_with(&u, &dispatcher).unwrap(), t.elem_mult(&u).unwrap());
        }

        #[test]
        fn prop_transpose_involution(t in tensor_strategy()) {
            let back = t.transpose().unwrap().transpose().unwrap();
            prop_assert_eq!(back, t);
        }

        #[test]
        fn prop_permute_inverse(t in tensor_strategy()) {
            let rank = t.rank();
            let perm: Vec<usize> = (0..rank).map(|k| (k + 1) % rank).collect();
            let mut inverse = vec![0; rank];
            for (k, &p) in perm.iter().enumerate() {
                inverse[p] = k;
            }
            let permuted = t.permute(&perm).unwrap();
            let concurrent = t.permute_with(&perm, &concurrent()).unwrap();
            prop_assert_eq!(&permuted, &concurrent);
            prop_assert_eq!(permuted.permute(&inverse).unwrap(), t);
        }

        #[test]
        fn prop_matmul_kernels_agree((a, b) in matrix_pair_strategy(), bs in 1usize..5) {
            let expected = a.matmul_using(&b, MatMulAlgorithm::Standard, bs).unwrap();
            for algorithm in [
                MatMulAlgorithm::Reordered,
                MatMulAlgorithm::Blocked,
                MatMulAlgorithm::Concurrent,
            ] {
                prop_assert_eq!(a.matmul_using(&b, algorithm, bs).unwrap(), expected.clone());
            }
        }

        #[test]
        fn prop_matmul_transpose_law((a, b) in matrix_pair_strategy()) {
            // (AB)^T = B^T A^T
            let lhs = a.matmul(&b).unwrap().transpose().unwrap();
            let rhs = b.transpose().unwrap().matmul(&a.transpose().unwrap()).unwrap();
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn prop_argmax_points_at_max(t in tensor_strategy()) {
            let index = t.argmax().unwrap();
            prop_assert_eq!(t.get(&index).unwrap(), t.max().unwrap());
            let index = t.argmin().unwrap();
            prop_assert_eq!(t.get(&index).unwrap(), t.min().unwrap());
        }
    }
}
