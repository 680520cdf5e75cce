//! Foreground execution context.
//!
//! Jobs posted to a [`ForegroundQueue`] wait until the thread that owns the
//! foreground (typically an application's main or UI loop) pumps them with
//! [`ForegroundQueue::run_pending`] or [`ForegroundQueue::run_for`].

use super::{Executor, Job};
use crossbeam_queue::SegQueue;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// A queue of jobs drained by whichever thread pumps it.
pub struct ForegroundQueue {
    jobs: SegQueue<Job>,
    pending: AtomicUsize,
    mutex: Mutex<()>,
    condvar: Condvar,
}

static FOREGROUND: OnceLock<Arc<ForegroundQueue>> = OnceLock::new();

/// Returns the process-wide foreground queue.
#[must_use]
pub fn foreground() -> Arc<ForegroundQueue> {
    Arc::clone(FOREGROUND.get_or_init(|| Arc::new(ForegroundQueue::new())))
}

impl ForegroundQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: SegQueue::new(),
            pending: AtomicUsize::new(0),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    /// Number of jobs waiting to be pumped.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Runs every job queued at the time of the call, plus any they enqueue.
    ///
    /// Returns the number of jobs run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Some(job) = self.jobs.pop() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            job();
            ran += 1;
        }
        ran
    }

    /// Pumps jobs as they arrive until `duration` elapses.
    ///
    /// Returns the number of jobs run.
    pub fn run_for(&self, duration: Duration) -> usize {
        let deadline = Instant::now().checked_add(duration);
        let mut ran = 0;
        loop {
            ran += self.run_pending();
            let mut guard = self.mutex.lock();
            if !self.jobs.is_empty() {
                continue;
            }
            if self.park(&mut guard, deadline) {
                drop(guard);
                return ran + self.run_pending();
            }
        }
    }

    /// Pumps jobs until `done` returns true or `timeout` elapses.
    ///
    /// Returns the final value of `done`.
    pub fn run_until(&self, timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            self.run_pending();
            if done() {
                return true;
            }
            let mut guard = self.mutex.lock();
            if !self.jobs.is_empty() {
                continue;
            }
            if self.park(&mut guard, deadline) {
                drop(guard);
                self.run_pending();
                return done();
            }
        }
    }

    /// Parks until a job is posted; returns true once `deadline` has passed.
    fn park(&self, guard: &mut MutexGuard<'_, ()>, deadline: Option<Instant>) -> bool {
        match deadline {
            Some(at) => self.condvar.wait_until(guard, at).timed_out(),
            None => {
                self.condvar.wait(guard);
                false
            }
        }
    }
}

impl Default for ForegroundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ForegroundQueue {
    fn execute(&self, job: Job) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.jobs.push(job);
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }
}

impl fmt::Debug for ForegroundQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForegroundQueue")
            .field("pending", &self.pending_count())
            .finish()
    }
}
