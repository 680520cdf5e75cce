//! User-supplied callback runners.

use super::{Executor, Job};
use std::fmt;
use std::sync::Arc;

/// Adapts a closure into an [`Executor`].
///
/// The closure receives each job and decides where and when it runs. It must
/// not run the job inline on the calling thread.
pub struct FnExecutor<F> {
    runner: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(Job) + Send + Sync,
{
    /// Wraps `runner`.
    pub const fn new(runner: F) -> Self {
        Self { runner }
    }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(Job) + Send + Sync,
{
    fn execute(&self, job: Job) {
        (self.runner)(job);
    }
}

impl<F> fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

/// Wraps a closure as a shareable executor.
pub fn from_fn<F>(runner: F) -> Arc<dyn Executor>
where
    F: Fn(Job) + Send + Sync + 'static,
{
    Arc::new(FnExecutor::new(runner))
}
