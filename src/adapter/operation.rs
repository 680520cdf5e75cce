//! Futures as schedulable operations.
//!
//! A [`FutureOperation`] wraps a block producing a value, an error, or a
//! future, so it can be handed to code that deals in units of work rather
//! than futures. The operation is finished exactly when its future is
//! terminal; a block that returns a future keeps the operation running until
//! that future settles.

use crate::error::Error;
use crate::executor::{self, Executor};
use crate::future::{produce, Completion, Future, IntoCompletion};
use crate::tracing_compat::debug;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Body<T> = Box<dyn FnOnce() -> Completion<T> + Send>;

struct OperationInner<T> {
    body: Mutex<Option<Body<T>>>,
    started: AtomicBool,
    future: Future<T>,
}

/// A cancellable unit of work backed by a future.
///
/// Clones refer to the same operation.
pub struct FutureOperation<T> {
    inner: Arc<OperationInner<T>>,
}

impl<T> Clone for FutureOperation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> FutureOperation<T> {
    /// Wraps `body`. The operation's future runs its callbacks on the default
    /// pool.
    pub fn new<F, R>(body: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        Self::new_on(executor::default_executor(), body)
    }

    /// Wraps `body`, with the operation's future running its callbacks on
    /// `executor`.
    pub fn new_on<F, R>(executor: Arc<dyn Executor>, body: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        let body: Body<T> = Box::new(move || produce(body));
        Self {
            inner: Arc::new(OperationInner {
                body: Mutex::new(Some(body)),
                started: AtomicBool::new(false),
                future: Future::new_on(executor),
            }),
        }
    }

    /// Creates an operation with no body yet; see [`FutureOperation::set_body`].
    #[must_use]
    pub fn empty() -> Self {
        Self::empty_on(executor::default_executor())
    }

    /// Like [`FutureOperation::empty`], with the future's callbacks running
    /// on `executor`.
    #[must_use]
    pub fn empty_on(executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(OperationInner {
                body: Mutex::new(None),
                started: AtomicBool::new(false),
                future: Future::new_on(executor),
            }),
        }
    }

    /// Installs or replaces the body.
    ///
    /// Returns false, dropping `body`, once the operation has started or
    /// finished.
    pub fn set_body<F, R>(&self, body: F) -> bool
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        let mut slot = self.inner.body.lock();
        if self.is_started() || self.is_finished() {
            return false;
        }
        *slot = Some(Box::new(move || produce(body)));
        true
    }

    /// Runs the body on the calling thread and completes the future with its
    /// classified result. An operation started without a body fails.
    ///
    /// Returns false if the operation already started or was cancelled, in
    /// which case the body does not run.
    pub fn start(&self) -> bool {
        let body = {
            let mut slot = self.inner.body.lock();
            if self.inner.started.swap(true, Ordering::AcqRel) {
                return false;
            }
            slot.take()
        };
        let future = &self.inner.future;
        if future.is_completed() {
            debug!(future_id = %future.id(), "operation settled before start; body skipped");
            return false;
        }
        match body {
            Some(body) => future.try_complete(body()),
            None => {
                debug!(future_id = %future.id(), "operation started without a body");
                future.try_fail(Error::user("operation started without a body"))
            }
        };
        true
    }

    /// Schedules [`FutureOperation::start`] on `executor`.
    pub fn enqueue(&self, executor: &dyn Executor) {
        let operation = self.clone();
        executor.execute(Box::new(move || {
            operation.start();
        }));
    }

    /// The future this operation completes.
    #[must_use]
    pub fn future(&self) -> &Future<T> {
        &self.inner.future
    }

    /// Returns true once [`FutureOperation::start`] has been called.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Returns true while started and not yet finished.
    #[must_use]
    pub fn is_executing(&self) -> bool {
        self.is_started() && !self.is_finished()
    }

    /// Returns true once the future is terminal.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.future.is_completed()
    }

    /// Returns true if the operation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.future.is_cancelled()
    }

    /// The value, once finished successfully.
    ///
    /// `None` before the operation finishes and after it fails or is
    /// cancelled. Never changes once finished.
    #[must_use]
    pub fn result(&self) -> Option<T> {
        self.inner.future.value()
    }

    /// The error, once finished unsuccessfully.
    ///
    /// A cancelled operation reports [`Error::cancelled`]. `None` before the
    /// operation finishes and after it succeeds. Never changes once finished.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        let future = &self.inner.future;
        if future.is_cancelled() {
            Some(Error::cancelled())
        } else {
            future.error()
        }
    }

    /// Cancels the operation's future, which also cancels any future the
    /// body chained to. A body that has not started yet never runs.
    pub fn cancel(&self) -> bool {
        let cancelled = self.inner.future.cancel();
        if cancelled {
            drop(self.inner.body.lock().take());
        }
        cancelled
    }

    /// Blocks until the operation finishes or `timeout` elapses.
    ///
    /// Returns true if it finished.
    pub fn wait_until_finished(&self, timeout: Duration) -> bool {
        self.inner.future.inner().wait(timeout).is_some()
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for FutureOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureOperation")
            .field("future", &self.inner.future)
            .field("started", &self.is_started())
            .finish()
    }
}
