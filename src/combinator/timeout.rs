//! Deadline combinator.
//!
//! `with_timeout(d)` derives a future that mirrors its source unless `d`
//! elapses first, in which case it fails with a timeout error. The source is
//! not cancelled by a timeout; it keeps running and its eventual outcome is
//! ignored by the derived future. Cancelling the derived future does cancel
//! the source.
//!
//! The deadline is armed on the global [`TimerService`] and disarmed as soon
//! as either side settles, so a stale timer never fires into a settled future.

use crate::error::Error;
use crate::future::Future;
use crate::time::TimerService;
use crate::tracing_compat::debug;
use std::sync::Arc;
use std::time::Duration;

impl<T: Clone + Send + 'static> Future<T> {
    /// Bounds the time for this future to settle.
    ///
    /// The derived future fails with [`Error::timeout`] if `after` elapses
    /// before the source settles, and never earlier.
    pub fn with_timeout(&self, after: Duration) -> Future<T> {
        let derived = Future::new_on(self.executor());
        derived.link_upstream(self);

        let target = derived.clone();
        let timer = TimerService::global().schedule(
            after,
            Box::new(move || {
                if target.try_fail(Error::timeout(after)) {
                    debug!(
                        future_id = %target.id(),
                        after_ms = after.as_millis() as u64,
                        "deadline elapsed"
                    );
                }
            }),
        );
        let timer = Arc::new(timer);

        // Derived settled by cancellation.
        let disarm = Arc::clone(&timer);
        derived.subscribe(move |_| {
            disarm.cancel();
        });

        let target = derived.clone();
        self.subscribe(move |outcome| {
            timer.cancel();
            target.settle(outcome);
        });
        derived
    }
}
