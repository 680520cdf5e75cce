//! Timer heap and the timer service thread.
//!
//! [`TimerHeap`] is a min-heap of deadlines; entries carry a generation so
//! that equal deadlines fire in insertion order and a cancelled entry can be
//! skipped lazily instead of removed. [`TimerService`] drives a heap from a
//! dedicated thread and runs each due job on that thread.

use crate::executor::Job;
use crate::tracing_compat::{debug, error, trace};
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// A timer entry in the heap.
#[derive(Debug, Clone, Eq, PartialEq)]
struct TimerEntry {
    deadline: Instant,
    /// Insertion order; doubles as the timer id.
    generation: u64,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first)
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap of timer ids ordered by deadline.
#[derive(Debug, Default)]
pub struct TimerHeap {
    heap: BinaryHeap<TimerEntry>,
    next_generation: u64,
}

impl TimerHeap {
    /// Creates a new empty timer heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of timers in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Adds a timer and returns its id.
    pub fn insert(&mut self, deadline: Instant) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.heap.push(TimerEntry {
            deadline,
            generation,
        });
        generation
    }

    /// Returns the earliest deadline, if any.
    #[must_use]
    pub fn peek_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|e| e.deadline)
    }

    /// Pops the ids of all timers whose deadline is at or before `now`.
    pub fn pop_expired(&mut self, now: Instant) -> Vec<u64> {
        let mut expired = Vec::new();
        while self.heap.peek().is_some_and(|e| e.deadline <= now) {
            if let Some(entry) = self.heap.pop() {
                expired.push(entry.generation);
            }
        }
        expired
    }

    /// Clears all timers.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

struct ServiceState {
    heap: TimerHeap,
    /// Armed jobs by timer id; a missing id means cancelled or fired.
    jobs: HashMap<u64, Job>,
}

struct Shared {
    state: Mutex<ServiceState>,
    condvar: Condvar,
}

/// A thread that runs jobs after a delay.
///
/// Jobs run on the service thread and must be short.
#[derive(Clone)]
pub struct TimerService {
    shared: Arc<Shared>,
}

/// Handle to an armed timer.
pub struct TimerHandle {
    id: u64,
    shared: Weak<Shared>,
}

static GLOBAL: OnceLock<TimerService> = OnceLock::new();

const LIVENESS_INTERVAL: Duration = Duration::from_millis(500);

impl TimerService {
    /// Starts a timer service on a new thread named `name`.
    ///
    /// The thread exits once every `TimerService` clone is dropped; jobs still
    /// armed at that point are dropped unrun.
    #[must_use]
    pub fn start(name: &str) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(ServiceState {
                heap: TimerHeap::new(),
                jobs: HashMap::new(),
            }),
            condvar: Condvar::new(),
        });
        let weak = Arc::downgrade(&shared);
        if let Err(e) = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || service_loop(&weak))
        {
            error!(error = %e, "failed to spawn timer thread");
        }
        Self { shared }
    }

    /// Returns the process-wide timer service, starting it on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| Self::start("pledge-timer"))
    }

    /// Arms a timer that runs `job` once `delay` has elapsed.
    ///
    /// A delay beyond the clock's range never fires; the job is dropped.
    pub fn schedule(&self, delay: Duration, job: Job) -> TimerHandle {
        let Some(deadline) = Instant::now().checked_add(delay) else {
            debug!(delay = ?delay, "delay out of clock range; timer will never fire");
            return TimerHandle {
                id: u64::MAX,
                shared: Weak::new(),
            };
        };
        let id = {
            let mut state = self.shared.state.lock();
            let id = state.heap.insert(deadline);
            state.jobs.insert(id, job);
            id
        };
        self.shared.condvar.notify_one();
        trace!(timer_id = id, delay_ms = delay.as_millis() as u64, "timer armed");
        TimerHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of armed timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn armed_count(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }
}

impl fmt::Debug for TimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerService")
            .field("armed", &self.armed_count())
            .finish()
    }
}

impl TimerHandle {
    /// Disarms the timer.
    ///
    /// Returns `true` if the job was removed before it started running.
    pub fn cancel(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let removed = shared.state.lock().jobs.remove(&self.id).is_some();
        if removed {
            trace!(timer_id = self.id, "timer cancelled");
        }
        removed
    }

    /// The timer's id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").field("id", &self.id).finish()
    }
}

fn service_loop(weak: &Weak<Shared>) {
    loop {
        let Some(shared) = weak.upgrade() else {
            debug!("timer service stopped");
            return;
        };

        let due: Vec<Job> = {
            let mut state = shared.state.lock();
            let now = Instant::now();
            let expired = state.heap.pop_expired(now);
            let due: Vec<Job> = expired
                .into_iter()
                .filter_map(|id| state.jobs.remove(&id))
                .collect();
            if due.is_empty() {
                // Drop cancelled entries eagerly once nothing is armed.
                if state.jobs.is_empty() {
                    state.heap.clear();
                }
                // Wake at least this often to notice the service was dropped.
                let liveness = now + LIVENESS_INTERVAL;
                let wake = state
                    .heap
                    .peek_deadline()
                    .map_or(liveness, |deadline| deadline.min(liveness));
                shared.condvar.wait_until(&mut state, wake);
            }
            due
        };

        for job in due {
            if catch_unwind(AssertUnwindSafe(job)).is_err() {
                error!("timer job panicked");
            }
        }
        drop(shared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn earliest_first() {
        let base = Instant::now();
        let mut heap = TimerHeap::new();
        let a = heap.insert(base + Duration::from_millis(100));
        let b = heap.insert(base + Duration::from_millis(50));
        let _c = heap.insert(base + Duration::from_millis(150));

        assert_eq!(heap.peek_deadline(), Some(base + Duration::from_millis(50)));
        assert_eq!(heap.pop_expired(base + Duration::from_millis(100)), vec![b, a]);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn equal_deadlines_fire_in_insertion_order() {
        let at = Instant::now();
        let mut heap = TimerHeap::new();
        let ids: Vec<u64> = (0..5).map(|_| heap.insert(at)).collect();
        assert_eq!(heap.pop_expired(at), ids);
        assert!(heap.is_empty());
    }

    #[test]
    fn scheduled_job_fires_after_delay() {
        crate::test_utils::init_test_logging();
        let service = TimerService::start("test-timer");
        let (tx, rx) = mpsc::channel();
        let start = Instant::now();
        let _handle = service.schedule(
            Duration::from_millis(30),
            Box::new(move || tx.send(Instant::now()).unwrap()),
        );
        let fired = rx.recv_timeout(Duration::from_secs(2)).expect("timer fired");
        assert!(fired.duration_since(start) >= Duration::from_millis(30));
        assert_eq!(service.armed_count(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let service = TimerService::start("test-timer-cancel");
        let (tx, rx) = mpsc::channel::<()>();
        let handle = service.schedule(
            Duration::from_millis(20),
            Box::new(move || tx.send(()).unwrap()),
        );
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(rx.recv_timeout(Duration::from_millis(80)).is_err());
    }

    #[test]
    fn unrepresentable_delay_never_arms() {
        let service = TimerService::start("test-timer-max");
        let handle = service.schedule(Duration::MAX, Box::new(|| {}));
        assert_eq!(service.armed_count(), 0);
        assert!(!handle.cancel());
    }

    #[test]
    fn earlier_timer_preempts_sleeping_service() {
        let service = TimerService::start("test-timer-preempt");
        let (tx, rx) = mpsc::channel();
        let tx_late = tx.clone();
        let _late = service.schedule(
            Duration::from_secs(5),
            Box::new(move || tx_late.send("late").unwrap()),
        );
        std::thread::sleep(Duration::from_millis(10));
        let _early = service.schedule(
            Duration::from_millis(10),
            Box::new(move || tx.send("early").unwrap()),
        );
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok("early"));
    }
}
