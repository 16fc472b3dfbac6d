//! Typed CPU-offload pool
//!
//! CPU-bound capability work is submitted as a typed closure and runs on
//! the blocking thread pool, bounded by a semaphore so a burst of heavy
//! calls cannot starve the async runtime. The submission contract is
//! plain Rust - nothing is serialized or re-parsed to move work across
//! the boundary.

use std::sync::Arc;
use tokio::sync::Semaphore;
use toolgate_domain::{Error, Result};

/// Bounded pool for CPU-bound capability work
#[derive(Clone)]
pub struct OffloadPool {
    permits: Arc<Semaphore>,
}

impl OffloadPool {
    /// Create a pool admitting at most `concurrency` tasks at once
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Run a CPU-bound task off the async runtime
    ///
    /// Suspends until a permit is free, then executes the closure on the
    /// blocking pool. The caller's await point is the only place the
    /// request task blocks.
    pub async fn run<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::internal("Offload pool closed"))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        })
        .await
        .map_err(|e| Error::internal(format!("Offloaded task panicked: {e}")))?
    }
}
