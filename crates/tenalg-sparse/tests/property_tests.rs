//! Property-based tests for sparse formats and mixed kernels
//!
//! Values are small integers stored as `f64`, so sums are exact and sparse
//! results can be compared with dense baselines by equality.

use proptest::prelude::*;
use tenalg_core::{DenseTensor, Dispatcher, FixedPolicy, KernelConfig, Shape};
use tenalg_sparse::{mixed, CooMatrix, CooTensor, CsrMatrix};

// ============================================================================
// Test Utilities
// ============================================================================

/// Random COO tensor of shape `dims`, possibly unsorted and with duplicates
fn coo_strategy(dims: Vec<usize>, max_nnz: usize) -> impl Strategy<Value = CooTensor<f64>> {
    let coords: Vec<_> = dims.iter().map(|&d| 0..d).collect();
    prop::collection::vec((coords, -20i32..20), 0..=max_nnz).prop_map(move |entries| {
        let (indices, values): (Vec<Vec<usize>>, Vec<f64>) = entries
            .into_iter()
            .map(|(index, v)| (index, f64::from(v)))
            .unzip();
        CooTensor::new(Shape::new(&dims), indices, values).expect("coordinates in range")
    })
}

fn dims_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 1..=3)
}

/// Two COO tensors of the same random shape
fn coo_pair_strategy() -> impl Strategy<Value = (CooTensor<f64>, CooTensor<f64>)> {
    dims_strategy().prop_flat_map(|dims| (coo_strategy(dims.clone(), 12), coo_strategy(dims, 12)))
}

fn matrix_strategy(nrows: usize, ncols: usize) -> impl Strategy<Value = CooMatrix<f64>> {
    prop::collection::vec((0..nrows, 0..ncols, -20i32..20), 0..=nrows * ncols).prop_map(
        move |entries| {
            let rows = entries.iter().map(|e| e.0).collect();
            let cols = entries.iter().map(|e| e.1).collect();
            let values = entries.iter().map(|e| f64::from(e.2)).collect();
            CooMatrix::new(nrows, ncols, rows, cols, values).expect("coordinates in range")
        },
    )
}

fn dense_strategy(dims: Vec<usize>) -> impl Strategy<Value = DenseTensor<f64>> {
    let n: usize = dims.iter().product();
    prop::collection::vec(-20i32..20, n).prop_map(move |values| {
        DenseTensor::from_vec(values.into_iter().map(f64::from).collect(), &dims)
            .expect("length matches shape")
    })
}

fn concurrent() -> Dispatcher {
    Dispatcher::with_policy(KernelConfig::new(), FixedPolicy::concurrent()).expect("valid config")
}

// ============================================================================
// Conversion Properties
// ============================================================================

proptest! {
    /// Property: fromDense(toDense(S)) equals S sorted, summed and without zeros
    #[test]
    fn prop_coo_dense_roundtrip(s in dims_strategy().prop_flat_map(|d| coo_strategy(d, 16))) {
        let back = CooTensor::from_dense(&s.to_dense().unwrap());
        prop_assert_eq!(back, s.coalesce().drop_zeros());
    }

    /// Property: COO → CSR → dense matches COO → dense
    #[test]
    fn prop_csr_from_coo_matches_dense(m in matrix_strategy(5, 4)) {
        let csr = m.to_csr();
        prop_assert!(csr.has_sorted_rows());
        prop_assert_eq!(csr.to_dense().unwrap(), m.to_dense().unwrap());
        prop_assert_eq!(csr.to_coo(), m.coalesce());
    }

    /// Property: lookups agree with the dense copy whether or not S is canonical
    #[test]
    fn prop_get_matches_dense(s in coo_strategy(vec![3, 4], 10)) {
        let dense = s.to_dense().unwrap();
        for i in 0..3 {
            for j in 0..4 {
                prop_assert_eq!(s.get(&[i, j]).unwrap(), dense[&[i, j]]);
            }
        }
    }
}

// ============================================================================
// Algebraic Properties
// ============================================================================

proptest! {
    /// Property: S + 0 = S and S - S = 0
    #[test]
    fn prop_additive_identity((s, _) in coo_pair_strategy()) {
        let zero = CooTensor::zeros(s.shape().clone());
        prop_assert_eq!(s.add(&zero).unwrap(), s.coalesce());
        prop_assert!(s.sub(&s).unwrap().to_dense().unwrap().is_zeros());
    }

    /// Property: A + B = B + A and A ⊙ B = B ⊙ A
    #[test]
    fn prop_commutativity((a, b) in coo_pair_strategy()) {
        prop_assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
        prop_assert_eq!(a.elem_mult(&b).unwrap(), b.elem_mult(&a).unwrap());
    }

    /// Property: sparse kernels agree with dense kernels
    #[test]
    fn prop_sparse_dense_equivalence((a, b) in coo_pair_strategy()) {
        let (da, db) = (a.to_dense().unwrap(), b.to_dense().unwrap());
        prop_assert_eq!(a.add(&b).unwrap().to_dense().unwrap(), da.add(&db).unwrap());
        prop_assert_eq!(a.sub(&b).unwrap().to_dense().unwrap(), da.sub(&db).unwrap());
        prop_assert_eq!(a.elem_mult(&b).unwrap().to_dense().unwrap(), da.elem_mult(&db).unwrap());
    }

    /// Property: CSR merges agree with dense kernels
    #[test]
    fn prop_csr_dense_equivalence(a in matrix_strategy(4, 3), b in matrix_strategy(4, 3)) {
        let (ca, cb) = (a.to_csr(), b.to_csr());
        let (da, db) = (a.to_dense().unwrap(), b.to_dense().unwrap());
        prop_assert_eq!(ca.add(&cb).unwrap().to_dense().unwrap(), da.add(&db).unwrap());
        prop_assert_eq!(ca.sub(&cb).unwrap().to_dense().unwrap(), da.sub(&db).unwrap());
        prop_assert_eq!(ca.elem_mult(&cb).unwrap().to_dense().unwrap(), da.elem_mult(&db).unwrap());
        prop_assert_eq!(mixed::sub_dense_csr(&da, &cb).unwrap(), da.sub(&db).unwrap());
        prop_assert_eq!(mixed::sub_csr_dense(&cb, &da).unwrap(), db.sub(&da).unwrap());
    }
}

// ============================================================================
// Structural Properties
// ============================================================================

proptest! {
    /// Property: swapping two axes twice restores the tensor
    #[test]
    fn prop_transpose_involution(s in coo_strategy(vec![2, 3, 4], 12), i in 0usize..3, j in 0usize..3) {
        let back = s.transpose_axes(i, j).unwrap().transpose_axes(i, j).unwrap();
        prop_assert_eq!(back, s.clone());
        prop_assert_eq!(
            s.transpose_axes(i, j).unwrap().to_dense().unwrap(),
            s.to_dense().unwrap().transpose_axes(i, j).unwrap()
        );
    }

    /// Property: CSR transpose is an involution on canonical matrices
    #[test]
    fn prop_csr_transpose_involution(m in matrix_strategy(3, 5)) {
        let csr = m.to_csr();
        prop_assert_eq!(csr.transpose().transpose(), csr);
    }

    /// Property: the contraction shape is the free axes in operand order
    #[test]
    fn prop_tensor_dot_shape_law(
        a in coo_strategy(vec![2, 3, 4], 10),
        b in coo_strategy(vec![4, 5], 8),
    ) {
        let out = a.tensor_dot(&b, &[2], &[0]).unwrap();
        prop_assert_eq!(out.dims(), &[2, 3, 5]);
        let expected = a.to_dense().unwrap().tensor_dot(&b.to_dense().unwrap(), &[2], &[0]).unwrap();
        prop_assert_eq!(out, expected);
    }
}

// ============================================================================
// Concurrency Properties
// ============================================================================

proptest! {
    /// Property: concurrent row-partitioned products equal sequential ones bit for bit
    #[test]
    fn prop_concurrent_products_match_sequential(
        m in matrix_strategy(7, 5),
        d in dense_strategy(vec![5, 3]),
        x in dense_strategy(vec![5]),
    ) {
        let csr = m.to_csr();
        let dispatcher = concurrent();
        prop_assert_eq!(
            csr.mat_mul_dense_with(&d, &dispatcher).unwrap(),
            csr.mat_mul_dense(&d).unwrap()
        );
        prop_assert_eq!(csr.mat_vec_with(&x, &dispatcher).unwrap(), csr.mat_vec(&x).unwrap());
        prop_assert_eq!(csr.mat_vec(&x).unwrap(), m.mat_vec(&x).unwrap());
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn sparse_matrix_plus_ones() {
    let sparse = CooTensor::new(
        Shape::new(&[3, 3]),
        vec![vec![0, 0], vec![1, 2]],
        vec![2.0, 3.0],
    )
    .unwrap();
    let ones = DenseTensor::<f64>::ones(&[3, 3]);
    let expected = DenseTensor::from_vec(
        vec![3.0, 1.0, 1.0, 1.0, 1.0, 4.0, 1.0, 1.0, 1.0],
        &[3, 3],
    )
    .unwrap();
    assert_eq!(mixed::add_dense_coo(&ones, &sparse).unwrap(), expected);

    let csr = CsrMatrix::from_coo(&CooMatrix::from_tensor(&sparse).unwrap());
    assert_eq!(mixed::add_dense_csr(&ones, &csr).unwrap(), expected);
}

#[test]
fn sorted_coo_to_dense() {
    let mut coo = CooTensor::new(Shape::new(&[2, 3]), vec![vec![0, 1]], vec![5.0]).unwrap();
    coo.sort_indices();
    let dense = coo.to_dense().unwrap();
    assert_eq!(dense.dims(), &[2, 3]);
    assert_eq!(dense.data(), &[0.0, 5.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn csr_times_vector() {
    let csr = CsrMatrix::new(vec![0, 1, 2], vec![0, 1], vec![2.0, 3.0], (2, 2)).unwrap();
    let x = DenseTensor::vector(vec![1.0, 1.0]);
    assert_eq!(csr.mat_vec(&x).unwrap().data(), &[2.0, 3.0]);
}
