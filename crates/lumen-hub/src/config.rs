//! Evaluation configuration - Worker count for batch reads
//!
//! Batch evaluation splits its signal list across `worker_count` threads that
//! share one read lock. With a single worker the batch runs on the caller's
//! thread.

use serde::{Deserialize, Serialize};

/// Configuration for batch evaluation
///
/// # Example
///
/// ```
/// use lumen_hub::EvalConfig;
///
/// // Inline evaluation (default)
/// let config = EvalConfig::default();
/// assert!(config.is_inline());
///
/// // Four workers, clamped to available cores
/// let config = EvalConfig::with_worker_count(4);
/// assert_eq!(config.worker_count(), 4.min(lumen_hub::max_workers()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Number of threads a batch is split across
    ///
    /// Clamped to `[1, max_workers()]`.
    worker_count: usize,
}

impl EvalConfig {
    /// Create a configuration with the given worker count
    ///
    /// The worker count is clamped to `[1, max_workers()]`.
    pub fn with_worker_count(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.clamp(1, max_workers()),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Set the number of workers, clamped to `[1, max_workers()]`
    pub fn set_worker_count(&mut self, n: usize) {
        self.worker_count = n.clamp(1, max_workers());
    }

    /// True when batches run on the caller's thread
    pub fn is_inline(&self) -> bool {
        self.worker_count == 1
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self { worker_count: 1 }
    }
}

/// Number of logical CPUs on this system
///
/// ```
/// assert!(lumen_hub::max_workers() >= 1);
/// ```
pub fn max_workers() -> usize {
    num_cpus::get()
}
