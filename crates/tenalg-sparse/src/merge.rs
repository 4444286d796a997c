//! Sorted coordinate streams
//!
//! Every sparse format in this crate stores its entries as a list of keys
//! (`Vec<usize>` multi-indices for tensors, `(row, col)` pairs for
//! matrices, plain `usize` for vectors) with a parallel list of values.
//! The kernels here operate on any `Ord` key type:
//!
//! - [`search`]: lexicographic binary search returning the match or the
//!   insertion point
//! - [`is_canonical`]: strictly increasing keys, i.e. sorted and duplicate free
//! - [`sort_by_key`] / [`coalesce`]: bring a stream into canonical form
//! - [`merge_union`] / [`merge_intersection`]: O(nnz_a + nnz_b) merge-joins
//!
//! The merge-joins require canonical input. The format types check
//! [`is_canonical`] (O(nnz)) before merging and coalesce operands that fail
//! it, so callers never see results built from unsorted streams.

use std::cmp::Ordering;

/// Binary search for `target` in canonical `keys`.
///
/// Returns `Ok(position)` on a hit and `Err(insertion_point)` on a miss, the
/// point at which `target` would have to be inserted to keep `keys` sorted.
pub fn search<K: Ord>(keys: &[K], target: &K) -> Result<usize, usize> {
    keys.binary_search(target)
}

/// Whether `keys` is strictly increasing.
pub fn is_canonical<K: Ord>(keys: &[K]) -> bool {
    keys.windows(2).all(|w| w[0] < w[1])
}

/// Stable sort of the entries by key; duplicates keep their relative order.
pub fn sort_by_key<K, T>(keys: Vec<K>, values: Vec<T>) -> (Vec<K>, Vec<T>)
where
    K: Ord,
{
    let mut entries: Vec<(K, T)> = keys.into_iter().zip(values).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().unzip()
}

/// Sort the entries and combine values sharing a key with `aggregate`, in
/// their original order.
pub fn coalesce<K, T, F>(keys: Vec<K>, values: Vec<T>, mut aggregate: F) -> (Vec<K>, Vec<T>)
where
    K: Ord,
    F: FnMut(&T, &T) -> T,
{
    let (keys, values) = if is_canonical(&keys) {
        (keys, values)
    } else {
        sort_by_key(keys, values)
    };

    let mut out_keys: Vec<K> = Vec::with_capacity(keys.len());
    let mut out_values: Vec<T> = Vec::with_capacity(values.len());
    for (key, value) in keys.into_iter().zip(values) {
        match (out_keys.last(), out_values.last_mut()) {
            (Some(last), Some(acc)) if *last == key => {
                *acc = aggregate(acc, &value);
            }
            _ => {
                out_keys.push(key);
                out_values.push(value);
            }
        }
    }
    (out_keys, out_values)
}

/// Merge two canonical streams, keeping every key present in either.
///
/// Matching keys are combined with `both`; keys found on one side only are
/// mapped through `only_a` / `only_b`. The output is canonical.
pub fn merge_union<K, T, FB, FA, FO>(
    (a_keys, a_values): (&[K], &[T]),
    (b_keys, b_values): (&[K], &[T]),
    mut both: FB,
    mut only_a: FA,
    mut only_b: FO,
) -> (Vec<K>, Vec<T>)
where
    K: Ord + Clone,
    FB: FnMut(&T, &T) -> T,
    FA: FnMut(&T) -> T,
    FO: FnMut(&T) -> T,
{
    let capacity = a_keys.len() + b_keys.len();
    let mut keys = Vec::with_capacity(capacity);
    let mut values = Vec::with_capacity(capacity);
    let (mut i, mut j) = (0, 0);

    while i < a_keys.len() && j < b_keys.len() {
        match a_keys[i].cmp(&b_keys[j]) {
            Ordering::Equal => {
                keys.push(a_keys[i].clone());
                values.push(both(&a_values[i], &b_values[j]));
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                keys.push(a_keys[i].clone());
                values.push(only_a(&a_values[i]));
                i += 1;
            }
            Ordering::Greater => {
                keys.push(b_keys[j].clone());
                values.push(only_b(&b_values[j]));
                j += 1;
            }
        }
    }
    for (key, value) in a_keys[i..].iter().zip(&a_values[i..]) {
        keys.push(key.clone());
        values.push(only_a(value));
    }
    for (key, value) in b_keys[j..].iter().zip(&b_values[j..]) {
        keys.push(key.clone());
        values.push(only_b(value));
    }
    (keys, values)
}

/// Merge two canonical streams, keeping only keys present in both.
pub fn merge_intersection<K, T, F>(
    (a_keys, a_values): (&[K], &[T]),
    (b_keys, b_values): (&[K], &[T]),
    mut both: F,
) -> (Vec<K>, Vec<T>)
where
    K: Ord + Clone,
    F: FnMut(&T, &T) -> T,
{
    let capacity = a_keys.len().min(b_keys.len());
    let mut keys = Vec::with_capacity(capacity);
    let mut values = Vec::with_capacity(capacity);
    let (mut i, mut j) = (0, 0);

    while i < a_keys.len() && j < b_keys.len() {
        match a_keys[i].cmp(&b_keys[j]) {
            Ordering::Equal => {
                keys.push(a_keys[i].clone());
                values.push(both(&a_values[i], &b_values[j]));
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    (keys, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_hit_and_insertion_point() {
        let keys = vec![vec![0, 1], vec![1, 0], vec![1, 2], vec![3, 0]];
        assert_eq!(search(&keys, &vec![1, 2]), Ok(2));
        assert_eq!(search(&keys, &vec![0, 0]), Err(0));
        assert_eq!(search(&keys, &vec![1, 1]), Err(2));
        assert_eq!(search(&keys, &vec![4, 0]), Err(4));
        assert_eq!(search::<Vec<usize>>(&[], &vec![0]), Err(0));
    }

    #[test]
    fn test_lexicographic_order_first_axis_decides() {
        assert!(vec![0, 9, 9] < vec![1, 0, 0]);
        assert!(is_canonical(&[vec![0, 9], vec![1, 0], vec![1, 1]]));
        assert!(!is_canonical(&[vec![1, 0], vec![0, 9]]));
        assert!(!is_canonical(&[(1, 1), (1, 1)]));
    }

    #[test]
    fn test_coalesce_sums_duplicates_in_order() {
        let keys = vec![3usize, 1, 3, 0, 1];
        let values = vec![1, 2, 3, 4, 5];
        let (k, v) = coalesce(keys, values, |a, b| a + b);
        assert_eq!(k, vec![0, 1, 3]);
        assert_eq!(v, vec![4, 7, 4]);

        let (k, v) = coalesce(vec![2usize, 2], vec!["a".to_string(), "b".to_string()], |a, b| {
            format!("{a}{b}")
        });
        assert_eq!(k, vec![2]);
        assert_eq!(v, vec!["ab".to_string()]);
    }

    #[test]
    fn test_merge_union() {
        let a_keys = [0usize, 2, 4];
        let b_keys = [1usize, 2, 5];
        let (k, v) = merge_union(
            (&a_keys[..], &[1, 2, 3][..]),
            (&b_keys[..], &[10, 20, 30][..]),
            |x, y| x - y,
            |x| *x,
            |y| -y,
        );
        assert_eq!(k, vec![0, 1, 2, 4, 5]);
        assert_eq!(v, vec![1, -10, -18, 3, -30]);
    }

    #[test]
    fn test_merge_intersection() {
        let a_keys = [(0usize, 0usize), (0, 2), (1, 1)];
        let b_keys = [(0usize, 2usize), (1, 0), (1, 1)];
        let (k, v) = merge_intersection(
            (&a_keys[..], &[1, 2, 3][..]),
            (&b_keys[..], &[4, 5, 6][..]),
            |x, y| x * y,
        );
        assert_eq!(k, vec![(0, 2), (1, 1)]);
        assert_eq!(v, vec![8, 18]);
    }

    #[test]
    fn test_merge_with_empty_side() {
        let (k, v) = merge_union(
            (&[] as &[usize], &[] as &[i32]),
            (&[3usize][..], &[7][..]),
            |x, y| x + y,
            |x| *x,
            |y| *y,
        );
        assert_eq!((k, v), (vec![3], vec![7]));
    }
}
