//! Execution contexts: where listener callbacks run.
//!
//! Every [`Future`](crate::Future) owns an [`Executor`] and drains its
//! listener registry through it. The engine never invokes a listener on the
//! thread that completed the future, and never while a future's lock is held.
//!
//! Built-in contexts:
//!
//! - [`default_executor`]: the process-wide background [`WorkerPool`]
//! - [`DispatchQueue`]: explicit serial or concurrent queues
//! - [`ForegroundQueue`]: jobs pumped by a designated foreground thread
//! - [`FnExecutor`]: any user-supplied `Fn(Job)`

mod custom;
mod foreground;
mod pool;
mod queue;

pub use custom::{from_fn, FnExecutor};
pub use foreground::{foreground, ForegroundQueue};
pub use pool::{WorkerPool, WorkerPoolHandle};
pub use queue::DispatchQueue;

use crate::config::PoolConfig;
use crate::tracing_compat::warn;
use std::sync::{Arc, OnceLock};

/// A unit of work handed to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// A strategy for running jobs asynchronously relative to the caller.
///
/// Implementations must not run the job inline on the calling thread; the
/// engine relies on that to avoid re-entrancy into a future's lock.
pub trait Executor: Send + Sync {
    /// Schedules `job` to run.
    fn execute(&self, job: Job);
}

static DEFAULT_POOL: OnceLock<Arc<WorkerPool>> = OnceLock::new();

/// Installs the process-wide default pool with an explicit configuration.
///
/// Returns `false` if the default pool was already built, in which case the
/// configuration is ignored.
pub fn init_default_pool(config: PoolConfig) -> bool {
    let mut installed = false;
    DEFAULT_POOL.get_or_init(|| {
        installed = true;
        Arc::new(WorkerPool::with_config(config))
    });
    installed
}

/// Returns the process-wide background executor.
///
/// Built lazily from the environment (see [`crate::config`]). Lives for the
/// rest of the process and needs no teardown.
#[must_use]
pub fn default_executor() -> Arc<dyn Executor> {
    let pool = DEFAULT_POOL.get_or_init(|| {
        let config = PoolConfig::from_env().unwrap_or_else(|err| {
            warn!(error = %err, "ignoring invalid pool environment; using defaults");
            PoolConfig::default()
        });
        Arc::new(WorkerPool::with_config(config))
    });
    Arc::clone(pool) as Arc<dyn Executor>
}
