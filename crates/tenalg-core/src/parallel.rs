//! Range-partitioned fork-join execution
//!
//! Concurrent kernels hand a destination buffer to [`run_partitioned`] (or
//! its block-aligned sibling [`run_blocked_partitioned`]). The buffer is
//! viewed as `units` consecutive runs of `unit_len` elements (a unit is
//! usually one output row), the unit range `[0, units)` is split into
//! contiguous, non-overlapping chunks, and one task per chunk runs on the
//! shared Rayon pool. The call returns once every chunk has finished.
//!
//! Each destination element belongs to exactly one chunk, so results do not
//! depend on scheduling order.
//!
//! Without the `parallel` feature the chunks run one after another on the
//! calling thread.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::parallel::run_partitioned;
//!
//! let mut squares = vec![0usize; 10];
//! run_partitioned(&mut squares, 1, |range, chunk| {
//!     for (slot, i) in chunk.iter_mut().zip(range) {
//!         *slot = i * i;
//!     }
//! });
//! assert_eq!(squares[9], 81);
//! ```

use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of chunks to split work into.
pub fn worker_count() -> usize {
    #[cfg(feature = "parallel")]
    {
        rayon::current_num_threads().max(1)
    }
    #[cfg(not(feature = "parallel"))]
    {
        1
    }
}

/// Split `[0, total)` into at most `parts` contiguous ranges of near-equal length.
///
/// Empty ranges are omitted, so the result is empty when `total == 0`.
pub fn partition(total: usize, parts: usize) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    let parts = parts.clamp(1, total);
    let chunk = total.div_ceil(parts);
    (0..total)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(total))
        .collect()
}

/// Like [`partition`], but every interior boundary is a multiple of `block_size`.
pub fn blocked_partition(total: usize, block_size: usize, parts: usize) -> Vec<Range<usize>> {
    let block_size = block_size.max(1);
    let blocks = total.div_ceil(block_size);
    partition(blocks, parts)
        .into_iter()
        .map(|r| r.start * block_size..(r.end * block_size).min(total))
        .collect()
}

fn split_by_ranges<'a, T>(
    dest: &'a mut [T],
    unit_len: usize,
    ranges: &[Range<usize>],
) -> Vec<(Range<usize>, &'a mut [T])> {
    let mut rest = dest;
    let mut pieces = Vec::with_capacity(ranges.len());
    for range in ranges {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * unit_len);
        pieces.push((range.clone(), head));
        rest = tail;
    }
    pieces
}

fn units_of<T>(dest: &[T], unit_len: usize) -> usize {
    assert!(unit_len > 0, "unit length must be positive");
    assert_eq!(
        dest.len() % unit_len,
        0,
        "destination length must be a multiple of the unit length"
    );
    dest.len() / unit_len
}

fn execute<T, F>(pieces: Vec<(Range<usize>, &mut [T])>, task: F)
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        pieces
            .into_par_iter()
            .for_each(|(range, chunk)| task(range, chunk));
    }
    #[cfg(not(feature = "parallel"))]
    {
        for (range, chunk) in pieces {
            task(range, chunk);
        }
    }
}

/// Run `task(units, chunk)` over contiguous chunks of `dest`.
///
/// `dest` holds `dest.len() / unit_len` units; `task` receives the unit range
/// it owns and the matching sub-slice of `dest`.
///
/// # Panics
///
/// Panics if `unit_len` is zero or does not divide `dest.len()`; both are
/// kernel bugs, not user errors.
pub fn run_partitioned<T, F>(dest: &mut [T], unit_len: usize, task: F)
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) + Send + Sync,
{
    let units = units_of(dest, unit_len);
    let ranges = partition(units, worker_count());
    execute(split_by_ranges(dest, unit_len, &ranges), task);
}

/// [`run_partitioned`] with chunk boundaries aligned to `block_size` units.
pub fn run_blocked_partitioned<T, F>(dest: &mut [T], unit_len: usize, block_size: usize, task: F)
where
    T: Send,
    F: Fn(Range<usize>, &mut [T]) + Send + Sync,
{
    let units = units_of(dest, unit_len);
    let ranges = blocked_partition(units, block_size, worker_count());
    execute(split_by_ranges(dest, unit_len, &ranges), task);
}

/// Fallible [`run_partitioned`]: the first error from any chunk is returned.
pub fn try_run_partitioned<T, E, F>(dest: &mut [T], unit_len: usize, task: F) -> Result<(), E>
where
    T: Send,
    E: Send,
    F: Fn(Range<usize>, &mut [T]) -> Result<(), E> + Send + Sync,
{
    let units = units_of(dest, unit_len);
    let ranges = partition(units, worker_count());
    let pieces = split_by_ranges(dest, unit_len, &ranges);
    #[cfg(feature = "parallel")]
    {
        pieces
            .into_par_iter()
            .try_for_each(|(range, chunk)| task(range, chunk))
    }
    #[cfg(not(feature = "parallel"))]
    {
        pieces
            .into_iter()
            .try_for_each(|(range, chunk)| task(range, chunk))
    }
}
