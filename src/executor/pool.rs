//! Worker pool backing the background and dispatch-queue execution contexts.
//!
//! The pool manages a set of OS threads draining a lock-free FIFO queue of
//! jobs. It supports:
//!
//! - **Capacity management**: Configurable min/max threads with dynamic scaling
//! - **Fairness**: FIFO ordering
//! - **Shutdown**: Graceful shutdown with bounded drain timeout
//!
//! ## Thread Lifecycle
//!
//! Threads are spawned lazily up to `max_threads`. When idle beyond a threshold,
//! threads above `min_threads` are retired. A pool with `max_threads == 1` runs
//! jobs strictly one after another in submission order.
//!
//! ## Panics
//!
//! A panicking job is logged and swallowed; the worker survives and keeps
//! draining the queue.

use crate::config::PoolConfig;
use crate::executor::{Executor, Job};
use crate::tracing_compat::{debug, error, warn};
use crossbeam_queue::SegQueue;
use parking_lot::{Condvar, Mutex};
use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Id of the pool owning the current thread, 0 when not a pool worker.
    static CURRENT_POOL: Cell<u64> = const { Cell::new(0) };
}

/// A thread pool executing queued jobs.
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

/// A cloneable handle to a [`WorkerPool`].
///
/// Handles keep the queue alive but do not shut the pool down when dropped.
#[derive(Clone)]
pub struct WorkerPoolHandle {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    id: u64,
    min_threads: usize,
    max_threads: usize,
    /// Threads currently alive.
    active_threads: AtomicUsize,
    /// Threads currently running a job.
    busy_threads: AtomicUsize,
    pending_count: AtomicUsize,
    queue: SegQueue<Job>,
    shutdown: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
    idle_timeout: Duration,
    thread_name_prefix: String,
    thread_handles: Mutex<Vec<JoinHandle<()>>>,
    next_thread: AtomicUsize,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("id", &self.inner.id)
            .field("min_threads", &self.inner.min_threads)
            .field("max_threads", &self.inner.max_threads)
            .field("active_threads", &self.active_threads())
            .field("pending_jobs", &self.pending_count())
            .finish()
    }
}

impl fmt::Debug for WorkerPoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPoolHandle")
            .field("id", &self.inner.id)
            .field(
                "active_threads",
                &self.inner.active_threads.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl WorkerPool {
    /// Creates a pool with the given thread limits and default options.
    #[must_use]
    pub fn new(min_threads: usize, max_threads: usize) -> Self {
        Self::with_config(PoolConfig {
            min_threads,
            max_threads,
            ..PoolConfig::default()
        })
    }

    /// Creates a pool from a [`PoolConfig`]. The config is normalized first.
    #[must_use]
    pub fn with_config(mut config: PoolConfig) -> Self {
        config.normalize();
        let inner = Arc::new(PoolInner {
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            min_threads: config.min_threads,
            max_threads: config.max_threads,
            active_threads: AtomicUsize::new(0),
            busy_threads: AtomicUsize::new(0),
            pending_count: AtomicUsize::new(0),
            queue: SegQueue::new(),
            shutdown: AtomicBool::new(false),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
            idle_timeout: config.idle_timeout,
            thread_name_prefix: config.thread_name_prefix,
            thread_handles: Mutex::new(Vec::with_capacity(config.max_threads)),
            next_thread: AtomicUsize::new(0),
        });

        for _ in 0..inner.min_threads {
            spawn_thread(&inner);
        }

        Self { inner }
    }

    /// Returns a cloneable handle to this pool.
    #[must_use]
    pub fn handle(&self) -> WorkerPoolHandle {
        WorkerPoolHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Queues a job.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        submit(&self.inner, Box::new(f));
    }

    /// Returns the number of queued jobs not yet picked up.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending_count.load(Ordering::Relaxed)
    }

    /// Returns the number of live worker threads.
    #[must_use]
    pub fn active_threads(&self) -> usize {
        self.inner.active_threads.load(Ordering::Relaxed)
    }

    /// Returns the number of threads currently executing a job.
    #[must_use]
    pub fn busy_threads(&self) -> usize {
        self.inner.busy_threads.load(Ordering::Relaxed)
    }

    /// Returns true if the calling thread is one of this pool's workers.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.inner.is_current()
    }

    /// Returns `true` if the pool is shut down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Initiates shutdown of the pool.
    ///
    /// New jobs are dropped. Queued jobs continue to execute.
    pub fn shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::Release);
        self.inner.notify_all();
    }

    /// Shuts down and waits for all threads to exit.
    ///
    /// Returns `true` if all threads exited cleanly, `false` if `timeout`
    /// elapsed first.
    pub fn shutdown_and_wait(&self, timeout: Duration) -> bool {
        self.shutdown();
        if self.inner.is_current() {
            // A worker cannot wait for itself to exit.
            return false;
        }

        let deadline = Instant::now() + timeout;
        while self.inner.active_threads.load(Ordering::Acquire) > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.inner.notify_all();
            thread::sleep(Duration::from_millis(5).min(remaining));
        }

        let handles: Vec<_> = self.inner.thread_handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
        true
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.shutdown_and_wait(Duration::from_secs(5));
    }
}

impl WorkerPoolHandle {
    /// Queues a job.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        submit(&self.inner, Box::new(f));
    }

    /// Returns true if the calling thread is one of this pool's workers.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.inner.is_current()
    }

    /// Returns `true` if the pool is shut down.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        submit(&self.inner, job);
    }
}

impl Executor for WorkerPoolHandle {
    fn execute(&self, job: Job) {
        submit(&self.inner, job);
    }
}

impl PoolInner {
    fn is_current(&self) -> bool {
        CURRENT_POOL.with(|c| c.get() == self.id)
    }

    fn notify_one(&self) {
        let _guard = self.mutex.lock();
        self.condvar.notify_one();
    }

    fn notify_all(&self) {
        let _guard = self.mutex.lock();
        self.condvar.notify_all();
    }
}

fn submit(inner: &Arc<PoolInner>, job: Job) {
    if inner.shutdown.load(Ordering::Acquire) {
        warn!(pool_id = inner.id, "job submitted to shut down pool; dropped");
        return;
    }
    // Count before pushing so a fast worker never decrements below zero.
    inner.pending_count.fetch_add(1, Ordering::AcqRel);
    inner.queue.push(job);
    maybe_spawn_thread(inner);
    inner.notify_one();
}

fn spawn_thread(inner: &Arc<PoolInner>) {
    inner.active_threads.fetch_add(1, Ordering::AcqRel);
    let worker = Arc::clone(inner);
    let n = inner.next_thread.fetch_add(1, Ordering::Relaxed);
    let name = format!("{}-worker-{}", inner.thread_name_prefix, n);

    let spawned = thread::Builder::new().name(name).spawn(move || {
        CURRENT_POOL.with(|c| c.set(worker.id));
        debug!(pool_id = worker.id, "worker thread started");
        worker_loop(&worker);
        debug!(pool_id = worker.id, "worker thread exiting");
    });

    match spawned {
        Ok(handle) => {
            let mut handles = inner.thread_handles.lock();
            handles.retain(|h| !h.is_finished());
            handles.push(handle);
        }
        Err(e) => {
            inner.active_threads.fetch_sub(1, Ordering::AcqRel);
            error!(pool_id = inner.id, error = %e, "failed to spawn worker thread");
        }
    }
}

fn maybe_spawn_thread(inner: &Arc<PoolInner>) {
    let active = inner.active_threads.load(Ordering::Acquire);
    let busy = inner.busy_threads.load(Ordering::Acquire);
    let pending = inner.pending_count.load(Ordering::Acquire);
    let idle = active.saturating_sub(busy);

    // Below max and more queued jobs than idle workers to take them.
    if active < inner.max_threads && pending > idle {
        spawn_thread(inner);
    }
}

fn worker_loop(inner: &PoolInner) {
    loop {
        // Marked busy before popping so a popped job is always accounted for.
        inner.busy_threads.fetch_add(1, Ordering::AcqRel);
        if let Some(job) = inner.queue.pop() {
            inner.pending_count.fetch_sub(1, Ordering::AcqRel);
            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                error!(pool_id = inner.id, "job panicked");
            }
            inner.busy_threads.fetch_sub(1, Ordering::AcqRel);
            continue;
        }
        inner.busy_threads.fetch_sub(1, Ordering::AcqRel);

        if inner.shutdown.load(Ordering::Acquire) {
            break;
        }

        let mut guard = inner.mutex.lock();
        // Re-check under the lock; producers notify while holding it.
        if !inner.queue.is_empty() || inner.shutdown.load(Ordering::Acquire) {
            continue;
        }

        if inner.active_threads.load(Ordering::Acquire) > inner.min_threads {
            let timed_out = inner
                .condvar
                .wait_for(&mut guard, inner.idle_timeout)
                .timed_out();
            drop(guard);
            if timed_out && inner.queue.is_empty() {
                inner.active_threads.fetch_sub(1, Ordering::AcqRel);
                // A job pushed after the decrement saw one fewer thread and may
                // not have spawned a replacement; take it ourselves.
                if inner.queue.is_empty() || inner.shutdown.load(Ordering::Acquire) {
                    debug!(pool_id = inner.id, "idle worker retiring");
                    return;
                }
                inner.active_threads.fetch_add(1, Ordering::AcqRel);
            }
        } else {
            inner.condvar.wait(&mut guard);
        }
    }
    inner.active_threads.fetch_sub(1, Ordering::AcqRel);
}
