//! Re-contextualization: observe a future on a different executor.

use crate::executor::{foreground, Executor};
use crate::future::Future;
use std::sync::Arc;

impl<T: Clone + Send + 'static> Future<T> {
    /// Derives a future that mirrors this one but runs its callbacks on
    /// `executor`.
    ///
    /// The source is unaffected. Cancelling the derived future cancels the
    /// source.
    pub fn with_context(&self, executor: Arc<dyn Executor>) -> Future<T> {
        let derived = Future::new_on(executor);
        derived.complete_with(self);
        derived
    }

    /// Derives a future whose callbacks run on the process-wide
    /// [`ForegroundQueue`](crate::executor::ForegroundQueue).
    pub fn on_foreground(&self) -> Future<T> {
        self.with_context(foreground())
    }
}
