//! The shared state behind every [`Future`](super::Future) handle.
//!
//! One mutex guards the terminal outcome, the listener registry and the
//! upstream links together, so "check terminal, then store or fire" is a
//! single critical section and a transition happens exactly once. Listeners
//! are always handed to the future's executor after the lock is released.

use super::link::{Cancel, Upstream};
use crate::error::{Error, Result};
use crate::executor::{Executor, Job};
use crate::tracing_compat::trace;
use crate::types::{FutureId, FutureState, Outcome};
use parking_lot::{Condvar, Mutex};
use std::mem;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// A registered callback, tagged with the outcome it observes.
pub(crate) enum Listener<T> {
    Success(Box<dyn FnOnce(T) + Send>),
    Failure(Box<dyn FnOnce(Error) + Send>),
    Complete(Box<dyn FnOnce(Result<T>) + Send>),
    Cancel(Box<dyn FnOnce() + Send>),
    /// Engine-internal relay; observes every outcome, cancellation included.
    Settle(Box<dyn FnOnce(Outcome<T>) + Send>),
}

impl<T: Clone + Send + 'static> Listener<T> {
    /// Binds the listener to `outcome`.
    ///
    /// Returns `None` if the listener does not observe this kind of outcome.
    fn bind(self, outcome: &Outcome<T>) -> Option<Job> {
        match (self, outcome) {
            (Self::Success(f), Outcome::Ok(v)) => {
                let v = v.clone();
                Some(Box::new(move || f(v)))
            }
            (Self::Failure(f), Outcome::Err(e)) => {
                let e = e.clone();
                Some(Box::new(move || f(e)))
            }
            (Self::Complete(f), Outcome::Ok(v)) => {
                let v = v.clone();
                Some(Box::new(move || f(Ok(v))))
            }
            (Self::Complete(f), Outcome::Err(e)) => {
                let e = e.clone();
                Some(Box::new(move || f(Err(e))))
            }
            (Self::Cancel(f), Outcome::Cancelled) => Some(f),
            (Self::Settle(f), outcome) => {
                let outcome = outcome.clone();
                Some(Box::new(move || f(outcome)))
            }
            _ => None,
        }
    }
}

struct Cell<T> {
    outcome: Option<Outcome<T>>,
    listeners: Vec<Listener<T>>,
    upstream: Upstream,
}

pub(crate) struct Inner<T> {
    id: FutureId,
    cell: Mutex<Cell<T>>,
    settled: Condvar,
    executor: Arc<dyn Executor>,
}

impl<T: Clone + Send + 'static> Inner<T> {
    pub(crate) fn new(executor: Arc<dyn Executor>, outcome: Option<Outcome<T>>) -> Self {
        Self {
            id: FutureId::next(),
            cell: Mutex::new(Cell {
                outcome,
                listeners: Vec::new(),
                upstream: Upstream::default(),
            }),
            settled: Condvar::new(),
            executor,
        }
    }

    pub(crate) fn id(&self) -> FutureId {
        self.id
    }

    pub(crate) fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub(crate) fn state(&self) -> FutureState {
        self.cell
            .lock()
            .outcome
            .as_ref()
            .map_or(FutureState::Pending, Outcome::state)
    }

    /// Runs `f` against the current outcome under the lock.
    pub(crate) fn read<R>(&self, f: impl FnOnce(Option<&Outcome<T>>) -> R) -> R {
        f(self.cell.lock().outcome.as_ref())
    }

    /// Moves a pending future to `outcome`.
    ///
    /// Returns false, changing nothing, if the future is already terminal.
    /// On success the registry is drained: matching listeners are handed to
    /// the executor in registration order and the rest are dropped. A
    /// cancellation is then forwarded upstream.
    pub(crate) fn settle(&self, outcome: Outcome<T>) -> bool {
        let (listeners, upstream) = {
            let mut cell = self.cell.lock();
            if cell.outcome.is_some() {
                return false;
            }
            cell.outcome = Some(outcome.clone());
            (
                mem::take(&mut cell.listeners),
                mem::take(&mut cell.upstream),
            )
        };
        self.settled.notify_all();
        trace!(
            future_id = %self.id,
            state = %outcome.state(),
            listeners = listeners.len(),
            "future settled"
        );

        for listener in listeners {
            if let Some(job) = listener.bind(&outcome) {
                self.executor.execute(job);
            }
        }
        if outcome.is_cancelled() {
            upstream.cancel_all(self.id);
        }
        true
    }

    /// Stores `listener`, or dispatches it at once if the future is terminal.
    pub(crate) fn register(&self, listener: Listener<T>) {
        let outcome = {
            let mut cell = self.cell.lock();
            match &cell.outcome {
                None => {
                    cell.listeners.push(listener);
                    return;
                }
                Some(outcome) => outcome.clone(),
            }
        };
        if let Some(job) = listener.bind(&outcome) {
            self.executor.execute(job);
        }
    }

    /// Adds an upstream link. Returns false if the future is already terminal.
    pub(crate) fn link(&self, parent: Weak<dyn Cancel>) -> bool {
        let mut cell = self.cell.lock();
        if cell.outcome.is_some() {
            return false;
        }
        cell.upstream.push(parent);
        true
    }

    /// Adds the sole upstream link.
    ///
    /// Returns false if the future is terminal or already linked.
    pub(crate) fn link_exclusive(&self, parent: Weak<dyn Cancel>) -> bool {
        let mut cell = self.cell.lock();
        if cell.outcome.is_some() || !cell.upstream.is_empty() {
            return false;
        }
        cell.upstream.push(parent);
        true
    }

    /// Replaces every upstream link with `parent`.
    ///
    /// Used once the sources a combinator was built on have settled and its
    /// result now comes from a nested future. Returns false if terminal.
    pub(crate) fn relink(&self, parent: Weak<dyn Cancel>) -> bool {
        let mut cell = self.cell.lock();
        if cell.outcome.is_some() {
            return false;
        }
        cell.upstream.replace(parent);
        true
    }

    /// Blocks until the future is terminal or `timeout` elapses.
    ///
    /// Returns `None` on timeout.
    pub(crate) fn wait(&self, timeout: Duration) -> Option<Outcome<T>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut cell = self.cell.lock();
        loop {
            if let Some(outcome) = &cell.outcome {
                return Some(outcome.clone());
            }
            match deadline {
                Some(deadline) => {
                    if self.settled.wait_until(&mut cell, deadline).timed_out() {
                        return cell.outcome.clone();
                    }
                }
                None => self.settled.wait(&mut cell),
            }
        }
    }
}

impl<T: Clone + Send + 'static> Cancel for Inner<T> {
    fn cancel(&self) -> bool {
        self.settle(Outcome::Cancelled)
    }

    fn id(&self) -> FutureId {
        self.id
    }
}
