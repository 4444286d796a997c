//! Kernel configuration
//!
//! [`KernelConfig`] collects the knobs that steer kernel selection: the
//! block size of cache-blocked kernels, the entry counts above which each
//! operation family switches to its concurrent variant, the worker count
//! and the capacity of the dispatcher's shape cache.
//!
//! # Environment Variables
//!
//! `KernelConfig::default()` honours:
//!
//! - `TENALG_BLOCK_SIZE`: block edge for blocked kernels (default: 64)
//! - `TENALG_NUM_THREADS`: worker threads, `0` for all cores (default: all cores)
//! - `TENALG_CACHE_CAPACITY`: dispatcher cache entries (default: 16)
//!
//! Unparseable values fall back to the defaults.
//!
//! # Examples
//!
//! ```
//! use tenalg_core::KernelConfig;
//!
//! let config = KernelConfig::new()
//!     .block_size(32)
//!     .elementwise_threshold(1_000);
//! assert_eq!(config.block_size, 32);
//! assert!(config.validate().is_ok());
//! ```

use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TensorError};

/// Default block edge for cache-blocked kernels
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Default capacity of the dispatcher's shape cache
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Configuration for kernel selection and execution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KernelConfig {
    /// Edge length of square blocks in blocked kernels (default: 64)
    pub block_size: usize,
    /// Worker threads (None = all available cores)
    pub num_threads: Option<usize>,
    /// Capacity of the dispatcher's recent-shape cache (default: 16)
    pub cache_capacity: usize,
    /// Entries above which add/sub/mult run concurrently (default: 50,000)
    pub elementwise_threshold: usize,
    /// Entries above which division runs concurrently (default: 25,000)
    pub division_threshold: usize,
    /// Matrix entries from which the cache-blocked transpose is used (default: 1,500)
    pub blocked_transpose_threshold: usize,
    /// Entries from which transposes run concurrently (default: 4,250,000)
    pub concurrent_transpose_threshold: usize,
    /// Entries from which Hermitian matrix transposes run concurrently (default: 50,000)
    pub hermitian_concurrent_threshold: usize,
    /// Output entries above which matrix products run concurrently (default: 50,000)
    pub matmul_threshold: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        let num_threads = env_or("TENALG_NUM_THREADS", 0usize);

        Self {
            block_size: env_or("TENALG_BLOCK_SIZE", DEFAULT_BLOCK_SIZE),
            num_threads: if num_threads == 0 {
                None
            } else {
                Some(num_threads)
            },
            cache_capacity: env_or("TENALG_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY),
            elementwise_threshold: 50_000,
            division_threshold: 25_000,
            blocked_transpose_threshold: 1_500,
            concurrent_transpose_threshold: 4_250_000,
            hermitian_concurrent_threshold: 50_000,
            matmul_threshold: 50_000,
        }
    }
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(fallback)
}

impl KernelConfig {
    /// Create a configuration from the environment and defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration whose thresholds force every concurrent kernel.
    ///
    /// Useful to exercise the parallel paths on small inputs.
    pub fn always_concurrent() -> Self {
        Self {
            elementwise_threshold: 0,
            division_threshold: 0,
            concurrent_transpose_threshold: 0,
            hermitian_concurrent_threshold: 0,
            matmul_threshold: 0,
            ..Self::default()
        }
    }

    /// Configuration whose thresholds never select a concurrent kernel.
    pub fn always_sequential() -> Self {
        Self {
            elementwise_threshold: usize::MAX,
            division_threshold: usize::MAX,
            concurrent_transpose_threshold: usize::MAX,
            hermitian_concurrent_threshold: usize::MAX,
            matmul_threshold: usize::MAX,
            ..Self::default()
        }
    }

    /// Set block size
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    /// Set number of worker threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Set dispatcher cache capacity
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the elementwise concurrency threshold
    pub fn elementwise_threshold(mut self, entries: usize) -> Self {
        self.elementwise_threshold = entries;
        self
    }

    /// Set the division concurrency threshold
    pub fn division_threshold(mut self, entries: usize) -> Self {
        self.division_threshold = entries;
        self
    }

    /// Set the matrix size from which blocked transposes are used
    pub fn blocked_transpose_threshold(mut self, entries: usize) -> Self {
        self.blocked_transpose_threshold = entries;
        self
    }

    /// Set the transpose concurrency threshold
    pub fn concurrent_transpose_threshold(mut self, entries: usize) -> Self {
        self.concurrent_transpose_threshold = entries;
        self
    }

    /// Set the matrix product concurrency threshold
    pub fn matmul_threshold(mut self, entries: usize) -> Self {
        self.matmul_threshold = entries;
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// [`TensorError::InvalidArgument`] for a zero block size, zero cache
    /// capacity or zero worker threads.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(TensorError::invalid_argument("block size must be positive"));
        }
        if self.cache_capacity == 0 {
            return Err(TensorError::invalid_argument(
                "cache capacity must be positive",
            ));
        }
        if self.num_threads == Some(0) {
            return Err(TensorError::invalid_argument(
                "thread count must be positive",
            ));
        }
        Ok(())
    }
}

/// Configure the global worker pool used by concurrent kernels.
///
/// Only the first successful call has an effect; the pool is process-wide
/// and lives until exit. Without the `parallel` feature this is a no-op.
///
/// # Example
///
/// ```
/// tenalg_core::configure_thread_pool(None).unwrap(); // use all cores
/// ```
pub fn configure_thread_pool(num_threads: Option<usize>) -> anyhow::Result<()> {
    #[cfg(feature = "parallel")]
    {
        if let Some(n) = num_threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global()
                .map_err(|e| anyhow::anyhow!("Failed to configure thread pool: {}", e))?;
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        let _ = num_threads;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = KernelConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            ..KernelConfig::default()
        };
        assert_eq!(config.blocked_transpose_threshold, 1_500);
        assert_eq!(config.concurrent_transpose_threshold, 4_250_000);
        assert_eq!(config.hermitian_concurrent_threshold, 50_000);
        assert!(config.division_threshold < config.elementwise_threshold);
    }

    #[test]
    fn test_builder() {
        let config = KernelConfig::new()
            .block_size(8)
            .num_threads(2)
            .cache_capacity(4)
            .matmul_threshold(10);
        assert_eq!(config.block_size, 8);
        assert_eq!(config.num_threads, Some(2));
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.matmul_threshold, 10);
    }

    #[test]
    fn test_validate() {
        assert!(KernelConfig::new().block_size(4).cache_capacity(2).validate().is_ok());
        assert!(KernelConfig::new().block_size(0).validate().is_err());
        assert!(KernelConfig::new()
            .block_size(4)
            .cache_capacity(0)
            .validate()
            .is_err());
        assert!(KernelConfig::new()
            .block_size(4)
            .cache_capacity(2)
            .num_threads(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_env_or_fallback() {
        assert_eq!(env_or("TENALG_TEST_UNSET_VARIABLE", 7usize), 7);
    }
}
