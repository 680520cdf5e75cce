//! Labelled dispatch queues.
//!
//! A serial queue runs its jobs one at a time in submission order on a single
//! dedicated thread. A concurrent queue runs up to `width` jobs at once.

use super::{Executor, Job, WorkerPool};
use crate::config::PoolConfig;
use std::fmt;
use std::sync::Arc;

/// A labelled queue of jobs backed by its own worker pool.
///
/// Clones share the same queue.
#[derive(Clone)]
pub struct DispatchQueue {
    label: Arc<str>,
    serial: bool,
    pool: Arc<WorkerPool>,
}

impl DispatchQueue {
    /// Creates a serial queue: one thread, FIFO, jobs never overlap.
    #[must_use]
    pub fn serial(label: &str) -> Self {
        Self::build(label, 1, 1, true)
    }

    /// Creates a concurrent queue running up to `width` jobs in parallel.
    ///
    /// Idle threads retire; a width of zero is treated as one.
    #[must_use]
    pub fn concurrent(label: &str, width: usize) -> Self {
        Self::build(label, 0, width.max(1), false)
    }

    fn build(label: &str, min_threads: usize, max_threads: usize, serial: bool) -> Self {
        let pool = WorkerPool::with_config(PoolConfig {
            min_threads,
            max_threads,
            thread_name_prefix: label.to_string(),
            ..PoolConfig::default()
        });
        Self {
            label: Arc::from(label),
            serial,
            pool: Arc::new(pool),
        }
    }

    /// The queue's label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns true for serial queues.
    #[must_use]
    pub fn is_serial(&self) -> bool {
        self.serial
    }

    /// Returns true if the calling thread is running a job of this queue.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.pool.is_current()
    }

    /// Queues a closure.
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(f);
    }

    /// This queue as a shareable executor.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::new(self.clone())
    }
}

impl Executor for DispatchQueue {
    fn execute(&self, job: Job) {
        self.pool.execute(job);
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("label", &self.label)
            .field("serial", &self.serial)
            .finish()
    }
}
