//! Shape-driven kernel selection
//!
//! Most operations come in several interchangeable kernels: a single-pass
//! loop and a range-partitioned concurrent loop, or a plain and a
//! cache-blocked transpose. All variants of one operation produce identical
//! results; they differ only in speed. A [`Dispatcher`] picks one from the
//! operand shapes:
//!
//! 1. The [`DispatchPolicy`] maps `(operation, lhs shape, rhs shape)` to a
//!    [`KernelChoice`]. [`ThresholdPolicy`] compares entry counts against the
//!    thresholds in [`KernelConfig`]; [`FixedPolicy`] always answers the same
//!    way and is meant for tests and benchmarks.
//! 2. Choices are memoised in a small LRU [`ShapeCache`]. The cache never
//!    affects results; a miss re-runs the policy.
//!
//! Kernels that accept a dispatcher have a `_with` variant taking it
//! explicitly. The plain variants use [`Dispatcher::global`], a default
//! instance built lazily from [`KernelConfig::default`].
//!
//! # Examples
//!
//! ```
//! use tenalg_core::dispatch::{Dispatcher, Execution, FixedPolicy, KernelChoice, Operation};
//! use tenalg_core::{KernelConfig, Shape};
//!
//! let dispatcher = Dispatcher::with_policy(KernelConfig::new().block_size(8).cache_capacity(4), FixedPolicy::sequential()).unwrap();
//! let shape = Shape::new(&[1000, 1000]);
//! assert_eq!(
//!     dispatcher.select(Operation::Add, &shape, &shape),
//!     KernelChoice::Elementwise(Execution::Sequential)
//! );
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::cache::{CacheStats, ShapeCache};
use crate::config::{configure_thread_pool, KernelConfig, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
use crate::error::Result;
use crate::shape::{DimVec, Shape};

/// Operation families the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Sub,
    ElemMult,
    ElemDiv,
    /// Axis swap or permutation
    Transpose,
    /// Axis swap or permutation with conjugation
    HermTranspose,
    /// Dense matrix product
    MatMul,
    /// Row-wise sparse kernels (sparse-dense products, matrix-vector products)
    SparseRows,
}

/// Sequential or range-partitioned concurrent execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Execution {
    Sequential,
    Concurrent,
}

/// Transpose kernels. All four are bit-identical in output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransposeAlgorithm {
    /// Direct strided loop
    Standard,
    /// Square cache blocks of `block_size`
    Blocked,
    /// Direct loop over destination ranges on the worker pool
    ConcurrentStandard,
    /// Cache blocks distributed over the worker pool
    ConcurrentBlocked,
}

impl TransposeAlgorithm {
    pub fn is_concurrent(self) -> bool {
        matches!(
            self,
            TransposeAlgorithm::ConcurrentStandard | TransposeAlgorithm::ConcurrentBlocked
        )
    }
}

/// Dense matrix product kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatMulAlgorithm {
    /// i-j-k inner products
    Standard,
    /// i-k-j loop order, streaming rows of the right operand
    Reordered,
    /// i-k-j over square blocks
    Blocked,
    /// i-k-j with output rows split over the worker pool
    Concurrent,
}

/// Kernel picked for one dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelChoice {
    Elementwise(Execution),
    Transpose(TransposeAlgorithm),
    MatMul(MatMulAlgorithm),
    Rows(Execution),
}

/// Strategy mapping an operation and operand shapes to a kernel.
///
/// For unary structural operations `rhs` is the result shape. Policies must
/// be pure: the same inputs must always yield the same choice.
pub trait DispatchPolicy: Send + Sync + fmt::Debug {
    fn choose(&self, op: Operation, lhs: &Shape, rhs: &Shape, config: &KernelConfig)
        -> KernelChoice;
}

fn execution_for(entries: usize, threshold: usize) -> Execution {
    if entries >= threshold {
        Execution::Concurrent
    } else {
        Execution::Sequential
    }
}

/// Entry-count thresholds taken from [`KernelConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdPolicy;

impl ThresholdPolicy {
    fn transpose(&self, shape: &Shape, hermitian: bool, config: &KernelConfig) -> TransposeAlgorithm {
        let entries = shape.total_entries();
        if shape.rank() != 2 {
            return if entries < config.concurrent_transpose_threshold {
                TransposeAlgorithm::Standard
            } else {
                TransposeAlgorithm::ConcurrentStandard
            };
        }
        if hermitian {
            return if entries < config.hermitian_concurrent_threshold {
                TransposeAlgorithm::Blocked
            } else {
                TransposeAlgorithm::ConcurrentBlocked
            };
        }
        if entries < config.blocked_transpose_threshold {
            TransposeAlgorithm::Standard
        } else if entries < config.concurrent_transpose_threshold {
            TransposeAlgorithm::Blocked
        } else {
            TransposeAlgorithm::ConcurrentBlocked
        }
    }

    fn matmul(&self, lhs: &Shape, rhs: &Shape, config: &KernelConfig) -> MatMulAlgorithm {
        let (m, k) = match lhs.dims() {
            [m, k] => (*m, *k),
            _ => return MatMulAlgorithm::Standard,
        };
        let n = rhs.dims().get(1).copied().unwrap_or(1);
        let output = m.saturating_mul(n);
        let work = output.saturating_mul(k);
        let block_entries = config.block_size.saturating_mul(config.block_size);

        if output >= config.matmul_threshold {
            MatMulAlgorithm::Concurrent
        } else if work < 32_768 {
            MatMulAlgorithm::Standard
        } else if rhs.total_entries() > block_entries.saturating_mul(16) {
            MatMulAlgorithm::Blocked
        } else {
            MatMulAlgorithm::Reordered
        }
    }
}

impl DispatchPolicy for ThresholdPolicy {
    fn choose(
        &self,
        op: Operation,
        lhs: &Shape,
        rhs: &Shape,
        config: &KernelConfig,
    ) -> KernelChoice {
        match op {
            Operation::Add | Operation::Sub | Operation::ElemMult => KernelChoice::Elementwise(
                execution_for(lhs.total_entries(), config.elementwise_threshold),
            ),
            Operation::ElemDiv => KernelChoice::Elementwise(execution_for(
                lhs.total_entries(),
                config.division_threshold,
            )),
            Operation::Transpose => KernelChoice::Transpose(self.transpose(lhs, false, config)),
            Operation::HermTranspose => KernelChoice::Transpose(self.transpose(lhs, true, config)),
            Operation::MatMul => KernelChoice::MatMul(self.matmul(lhs, rhs, config)),
            Operation::SparseRows => {
                KernelChoice::Rows(execution_for(rhs.total_entries(), config.matmul_threshold))
            }
        }
    }
}

/// Policy that always picks the same kernels, regardless of shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPolicy {
    pub execution: Execution,
    pub transpose: TransposeAlgorithm,
    pub matmul: MatMulAlgorithm,
}

impl FixedPolicy {
    /// Always the sequential plain kernels.
    pub fn sequential() -> Self {
        Self {
            execution: Execution::Sequential,
            transpose: TransposeAlgorithm::Standard,
            matmul: MatMulAlgorithm::Standard,
        }
    }

    /// Always the concurrent kernels.
    pub fn concurrent() -> Self {
        Self {
            execution: Execution::Concurrent,
            transpose: TransposeAlgorithm::ConcurrentBlocked,
            matmul: MatMulAlgorithm::Concurrent,
        }
    }
}

impl DispatchPolicy for FixedPolicy {
    fn choose(&self, op: Operation, _: &Shape, _: &Shape, _: &KernelConfig) -> KernelChoice {
        match op {
            Operation::Add | Operation::Sub | Operation::ElemMult | Operation::ElemDiv => {
                KernelChoice::Elementwise(self.execution)
            }
            Operation::Transpose | Operation::HermTranspose => {
                KernelChoice::Transpose(self.transpose)
            }
            Operation::MatMul => KernelChoice::MatMul(self.matmul),
            Operation::SparseRows => KernelChoice::Rows(self.execution),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DispatchKey {
    op: Operation,
    lhs: DimVec,
    rhs: DimVec,
}

/// Kernel selector: a policy, its configuration and a recent-shape cache.
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    policy: Arc<dyn DispatchPolicy>,
    config: KernelConfig,
    cache: ShapeCache<DispatchKey, KernelChoice>,
}

impl Dispatcher {
    /// Dispatcher using [`ThresholdPolicy`].
    ///
    /// # Errors
    ///
    /// Returns the error of [`KernelConfig::validate`].
    pub fn new(config: KernelConfig) -> Result<Self> {
        Self::with_policy(config, ThresholdPolicy)
    }

    /// Dispatcher using a custom policy.
    pub fn with_policy(config: KernelConfig, policy: impl DispatchPolicy + 'static) -> Result<Self> {
        config.validate()?;
        let cache = ShapeCache::try_new(config.cache_capacity)?;
        Ok(Self {
            policy: Arc::new(policy),
            config,
            cache,
        })
    }

    /// Process default dispatcher, built on first use from
    /// [`KernelConfig::default`].
    ///
    /// Only a convenience default for the plain kernel entry points; every
    /// kernel that consults it also has a `*_with(&Dispatcher)` form taking an
    /// explicit instance, which tests and embedders should prefer.
    ///
    /// An invalid environment configuration falls back to the built-in
    /// defaults. If the configuration names a thread count, the global worker
    /// pool is sized accordingly on first use.
    pub fn global() -> &'static Dispatcher {
        static GLOBAL: OnceLock<Dispatcher> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let mut config = KernelConfig::default();
            if let Err(err) = config.validate() {
                tracing::warn!(%err, "invalid kernel configuration in environment, using defaults");
                config.block_size = DEFAULT_BLOCK_SIZE;
                config.cache_capacity = DEFAULT_CACHE_CAPACITY;
                config.num_threads = None;
            }
            if let Err(err) = configure_thread_pool(config.num_threads) {
                tracing::warn!(%err, "worker pool already initialised");
            }
            Self::with_policy(config.clone(), ThresholdPolicy).unwrap_or_else(|_| Self {
                policy: Arc::new(ThresholdPolicy),
                cache: ShapeCache::new(std::num::NonZeroUsize::MIN),
                config,
            })
        })
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Block edge for blocked kernels.
    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Select a kernel for `op` on operands of shape `lhs` and `rhs`.
    pub fn select(&self, op: Operation, lhs: &Shape, rhs: &Shape) -> KernelChoice {
        let key = DispatchKey {
            op,
            lhs: DimVec::from_slice(lhs.dims()),
            rhs: DimVec::from_slice(rhs.dims()),
        };
        self.cache.get_or_insert_with(key, || {
            let choice = self.policy.choose(op, lhs, rhs, &self.config);
            tracing::debug!(?op, lhs = %lhs, rhs = %rhs, ?choice, "kernel selected");
            choice
        })
    }

    /// Execution mode for an elementwise operation on `shape`.
    pub fn elementwise(&self, op: Operation, shape: &Shape) -> Execution {
        match self.select(op, shape, shape) {
            KernelChoice::Elementwise(execution) | KernelChoice::Rows(execution) => execution,
            _ => Execution::Sequential,
        }
    }

    /// Transpose kernel for a tensor of shape `shape` producing `result`.
    pub fn transpose(&self, shape: &Shape, result: &Shape, hermitian: bool) -> TransposeAlgorithm {
        let op = if hermitian {
            Operation::HermTranspose
        } else {
            Operation::Transpose
        };
        match self.select(op, shape, result) {
            KernelChoice::Transpose(algorithm) => algorithm,
            _ => TransposeAlgorithm::Standard,
        }
    }

    /// Matrix product kernel for `lhs × rhs`.
    pub fn matmul(&self, lhs: &Shape, rhs: &Shape) -> MatMulAlgorithm {
        match self.select(Operation::MatMul, lhs, rhs) {
            KernelChoice::MatMul(algorithm) => algorithm,
            _ => MatMulAlgorithm::Standard,
        }
    }

    /// Execution mode for a row-wise sparse kernel producing `output`.
    pub fn sparse_rows(&self, sparse: &Shape, output: &Shape) -> Execution {
        match self.select(Operation::SparseRows, sparse, output) {
            KernelChoice::Rows(execution) | KernelChoice::Elementwise(execution) => execution,
            _ => Execution::Sequential,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::global().clone()
    }
}
