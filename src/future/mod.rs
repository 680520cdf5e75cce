//! The future handle: a write-once, thread-safe result cell with callbacks.
//!
//! A [`Future`] starts pending and moves exactly once into a terminal
//! [`Outcome`]: succeeded, failed, or cancelled. Any thread may try to
//! complete it; the first attempt wins and every later attempt reports
//! `false` without side effects.
//!
//! # Listeners
//!
//! Callbacks registered with [`Future::on_success`], [`Future::on_failure`],
//! [`Future::on_complete`] and [`Future::on_cancel`] run at most once, on the
//! future's [`Executor`], never on the completing thread and never under the
//! future's lock. A callback registered after the future is terminal is
//! dispatched immediately if it observes the outcome the future reached.
//! `on_complete` observes success and failure only; cancellation is reported
//! to `on_cancel` alone.
//!
//! # Cancellation
//!
//! [`Future::cancel`] moves a pending future to `Cancelled` and then forwards
//! the cancellation to the futures it was derived from. Links are weak and
//! forwarding only continues from futures that actually transitioned, so
//! cycles terminate.

mod cell;
mod completion;
mod link;

pub use completion::{Completion, IntoCompletion};

pub(crate) use cell::Inner;
pub(crate) use completion::produce;

use crate::error::{Error, Result};
use crate::executor::{self, Executor, Job};
use crate::tracing_compat::{debug, trace};
use crate::types::{FutureId, FutureState, Outcome};
use cell::Listener;
use core::fmt;
use link::Cancel;
use std::sync::{Arc, Weak};

/// A shareable handle to a future value.
///
/// Clones refer to the same underlying future.
pub struct Future<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Future<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates a pending future whose callbacks run on the default pool.
    #[must_use]
    pub fn new() -> Self {
        Self::new_on(executor::default_executor())
    }

    /// Creates a pending future whose callbacks run on `executor`.
    #[must_use]
    pub fn new_on(executor: Arc<dyn Executor>) -> Self {
        Self::from_inner(Inner::new(executor, None))
    }

    /// Creates a pending future whose callbacks are handed to `runner`.
    ///
    /// The runner decides where each callback job runs; it must not run the
    /// job inline.
    #[must_use]
    pub fn with_runner<F>(runner: F) -> Self
    where
        F: Fn(Job) + Send + Sync + 'static,
    {
        Self::new_on(executor::from_fn(runner))
    }

    /// Creates a future that has already succeeded with `value`.
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self::from_inner(Inner::new(
            executor::default_executor(),
            Some(Outcome::Ok(value)),
        ))
    }

    /// Creates a future that has already failed with `error`.
    #[must_use]
    pub fn err(error: Error) -> Self {
        Self::from_inner(Inner::new(
            executor::default_executor(),
            Some(Outcome::Err(error)),
        ))
    }

    /// Runs `block` on the default pool and completes the returned future
    /// with its classified result.
    ///
    /// See [`Future::spawn_on`].
    pub fn spawn<F, R>(block: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        Self::spawn_on(executor::default_executor(), block)
    }

    /// Runs `block` on `executor` and completes the returned future with its
    /// classified result. The future's callbacks also run on `executor`.
    ///
    /// If the future is cancelled before the block starts, the block never
    /// runs. A panicking block fails the future with a user error.
    pub fn spawn_on<F, R>(executor: Arc<dyn Executor>, block: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        let future = Self::new_on(Arc::clone(&executor));
        let target = future.clone();
        executor.execute(Box::new(move || {
            if target.is_completed() {
                trace!(future_id = %target.id(), "block skipped; future already settled");
                return;
            }
            target.try_complete(produce(block));
        }));
        future
    }

    fn from_inner(inner: Inner<T>) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// The future's id.
    #[must_use]
    pub fn id(&self) -> FutureId {
        self.inner.id()
    }

    /// The executor callbacks run on.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::clone(self.inner.executor())
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> FutureState {
        self.inner.state()
    }

    /// Returns true once the future is terminal, by any outcome.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state().is_terminal()
    }

    /// Returns true if the future succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state() == FutureState::Succeeded
    }

    /// Returns true if the future failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state() == FutureState::Failed
    }

    /// Returns true if the future was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == FutureState::Cancelled
    }

    /// The success value, if the future succeeded.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.inner.read(|outcome| match outcome {
            Some(Outcome::Ok(v)) => Some(v.clone()),
            _ => None,
        })
    }

    /// The error, if the future failed.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        self.inner.read(|outcome| match outcome {
            Some(Outcome::Err(e)) => Some(e.clone()),
            _ => None,
        })
    }

    /// The terminal outcome, or `None` while pending.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.inner.read(|outcome| outcome.cloned())
    }

    /// The result of a future that succeeded or failed.
    ///
    /// `None` while pending or after cancellation.
    #[must_use]
    pub fn result(&self) -> Option<Result<T>> {
        self.inner.read(|outcome| match outcome {
            Some(Outcome::Ok(v)) => Some(Ok(v.clone())),
            Some(Outcome::Err(e)) => Some(Err(e.clone())),
            _ => None,
        })
    }

    /// Returns true if both handles refer to the same future.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Succeeds with `value` if still pending.
    pub fn try_success(&self, value: T) -> bool {
        self.inner.settle(Outcome::Ok(value))
    }

    /// Fails with `error` if still pending.
    pub fn try_fail(&self, error: Error) -> bool {
        self.inner.settle(Outcome::Err(error))
    }

    /// Completes with a classified value.
    ///
    /// A value or error settles the future directly; a nested future is
    /// chained with [`Future::complete_with`].
    pub fn try_complete<R>(&self, completion: R) -> bool
    where
        R: IntoCompletion<Output = T>,
    {
        match completion.into_completion() {
            Completion::Value(v) => self.try_success(v),
            Completion::Error(e) => self.try_fail(e),
            Completion::Nested(other) => self.complete_with(&other),
        }
    }

    /// Chains this future to `other`: whatever outcome `other` reaches, this
    /// future reaches too, and cancelling this future cancels `other`.
    ///
    /// Returns false, changing nothing, if this future is terminal, is already
    /// linked to a source, or `other` is this very future.
    pub fn complete_with(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            debug!(future_id = %self.id(), "complete_with rejected: self-link");
            return false;
        }
        if !self.inner.link_exclusive(other.cancel_link()) {
            debug!(
                future_id = %self.id(),
                source_id = %other.id(),
                "complete_with rejected: already settled or linked"
            );
            return false;
        }
        let target = self.clone();
        other.subscribe(move |outcome| {
            target.settle(outcome);
        });
        true
    }

    /// Cancels the future if it is still pending, then forwards the
    /// cancellation to the futures it was derived from.
    ///
    /// Returns true if this call cancelled the future.
    pub fn cancel(&self) -> bool {
        self.inner.settle(Outcome::Cancelled)
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Runs `f` with the value if the future succeeds.
    pub fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.inner.register(Listener::Success(Box::new(f)));
        self
    }

    /// Runs `f` with the error if the future fails.
    pub fn on_failure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.inner.register(Listener::Failure(Box::new(f)));
        self
    }

    /// Runs `f` with the result if the future succeeds or fails.
    ///
    /// Not invoked on cancellation.
    pub fn on_complete<F>(&self, f: F) -> &Self
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        self.inner.register(Listener::Complete(Box::new(f)));
        self
    }

    /// Runs `f` if the future is cancelled.
    pub fn on_cancel<F>(&self, f: F) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.register(Listener::Cancel(Box::new(f)));
        self
    }

    // =========================================================================
    // Engine internals
    // =========================================================================

    /// Settles with `outcome` if still pending.
    pub(crate) fn settle(&self, outcome: Outcome<T>) -> bool {
        self.inner.settle(outcome)
    }

    /// Runs `f` with whatever terminal outcome the future reaches.
    pub(crate) fn subscribe<F>(&self, f: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.inner.register(Listener::Settle(Box::new(f)));
    }

    /// Completes with a mapper's result on behalf of a combinator.
    ///
    /// Unlike [`Future::try_complete`], a nested future takes over from the
    /// settled sources this future was derived from, so cancelling this
    /// future then reaches the nested one.
    pub(crate) fn resolve<R>(&self, completion: R) -> bool
    where
        R: IntoCompletion<Output = T>,
    {
        match completion.into_completion() {
            Completion::Value(v) => self.try_success(v),
            Completion::Error(e) => self.try_fail(e),
            Completion::Nested(other) => self.follow(&other),
        }
    }

    fn follow(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            debug!(future_id = %self.id(), "nested completion rejected: self-link");
            return false;
        }
        if !self.inner.relink(other.cancel_link()) {
            debug!(
                future_id = %self.id(),
                source_id = %other.id(),
                "nested completion ignored: already settled"
            );
            return false;
        }
        let target = self.clone();
        other.subscribe(move |outcome| {
            target.settle(outcome);
        });
        true
    }

    /// Records `parent` as a source this future was derived from.
    pub(crate) fn link_upstream<U: Clone + Send + 'static>(&self, parent: &Future<U>) -> bool {
        self.inner.link(parent.cancel_link())
    }

    pub(crate) fn inner(&self) -> &Inner<T> {
        &self.inner
    }

    fn cancel_link(&self) -> Weak<dyn Cancel> {
        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        weak
    }
}

impl<T: Clone + Send + 'static> Default for Future<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}
