//! Success and failure mapping.
//!
//! `transform` runs a mapper on the source's value; a source failure passes
//! through untouched and the mapper never runs. `recover` is the mirror image:
//! it runs on the error and lets a value pass through. Either mapper may
//! return a value, an error, or another future to chain to (see
//! [`IntoCompletion`]).
//!
//! The derived future runs its callbacks on the source's executor and is
//! cancelled when the source is. Cancelling the derived future cancels the
//! source.

use crate::error::Error;
use crate::future::{produce, Future, IntoCompletion};
use crate::types::Outcome;

impl<T: Clone + Send + 'static> Future<T> {
    /// Derives a future from this one's value.
    ///
    /// ```
    /// use pledge::Future;
    /// use std::time::Duration;
    ///
    /// let doubled = Future::ok(5).transform(|v| Ok(v * 2));
    /// assert_eq!(doubled.await_result(Duration::from_secs(1)), Ok(10));
    /// ```
    pub fn transform<U, F, R>(&self, mapper: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> R + Send + 'static,
        R: IntoCompletion<Output = U>,
    {
        let derived = Future::new_on(self.executor());
        derived.link_upstream(self);
        let target = derived.clone();
        self.subscribe(move |outcome| match outcome {
            Outcome::Ok(value) => {
                if !target.is_completed() {
                    target.resolve(produce(move || mapper(value)));
                }
            }
            Outcome::Err(error) => {
                target.try_fail(error);
            }
            Outcome::Cancelled => {
                target.cancel();
            }
        });
        derived
    }

    /// Derives a future from this one's error.
    ///
    /// A success passes through unchanged and `handler` never runs.
    pub fn recover<F, R>(&self, handler: F) -> Future<T>
    where
        F: FnOnce(Error) -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        let derived = Future::new_on(self.executor());
        derived.link_upstream(self);
        let target = derived.clone();
        self.subscribe(move |outcome| match outcome {
            Outcome::Ok(value) => {
                target.try_success(value);
            }
            Outcome::Err(error) => {
                if !target.is_completed() {
                    target.resolve(produce(move || handler(error)));
                }
            }
            Outcome::Cancelled => {
                target.cancel();
            }
        });
        derived
    }

    /// Chains a future-returning mapper. Equivalent to [`Future::transform`].
    pub fn flat_map<U, F>(&self, mapper: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        self.transform(mapper)
    }

    /// Chains a future-returning recovery. Equivalent to [`Future::recover`].
    pub fn recover_with<F>(&self, handler: F) -> Future<T>
    where
        F: FnOnce(Error) -> Future<T> + Send + 'static,
    {
        self.recover(handler)
    }
}
