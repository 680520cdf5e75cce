//! Blocking await.
//!
//! Parks the calling thread until a future is terminal or a timeout elapses.
//! Intended for tests, command-line tools and other synchronous call sites;
//! calling it from a job running on the future's own serial executor will
//! block that executor for the full timeout.

use crate::error::{Error, Result};
use crate::future::Future;
use crate::tracing_compat::debug;
use crate::types::Outcome;
use std::time::Duration;

/// Waits up to `timeout` for `future` to settle.
///
/// Returns the value on success and the error on failure. A cancelled
/// future yields [`Error::cancelled`]. If the timeout elapses first this
/// returns [`Error::timeout`] and the future is left untouched.
pub fn await_result<T>(future: &Future<T>, timeout: Duration) -> Result<T>
where
    T: Clone + Send + 'static,
{
    match future.inner().wait(timeout) {
        Some(Outcome::Ok(value)) => Ok(value),
        Some(Outcome::Err(error)) => Err(error),
        Some(Outcome::Cancelled) => Err(Error::cancelled()),
        None => {
            debug!(
                future_id = %future.id(),
                timeout_ms = timeout.as_millis() as u64,
                "await timed out"
            );
            Err(Error::timeout(timeout))
        }
    }
}

impl<T: Clone + Send + 'static> Future<T> {
    /// Waits up to `timeout` for this future to settle.
    ///
    /// See [`await_result`].
    pub fn await_result(&self, timeout: Duration) -> Result<T> {
        await_result(self, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn resolved_future_returns_immediately() {
        let f = Future::ok(8);
        let start = Instant::now();
        assert_eq!(await_result(&f, Duration::from_secs(10)), Ok(8));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wakes_when_another_thread_completes() {
        let f = Future::new();
        let completer = f.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.try_success("late");
        });
        assert_eq!(f.await_result(Duration::from_secs(2)), Ok("late"));
        handle.join().unwrap();
    }

    #[test]
    fn timeout_leaves_future_pending() {
        let f = Future::<i32>::new();
        let start = Instant::now();
        let err = f.await_result(Duration::from_millis(30)).unwrap_err();
        assert!(err.is_timeout());
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(!f.is_completed());
        assert!(f.try_success(1));
    }

    #[test]
    fn cancellation_reported_as_error() {
        let f = Future::<i32>::new();
        f.cancel();
        assert!(f.await_result(Duration::from_secs(1)).unwrap_err().is_cancelled());
    }

    #[test]
    fn failure_returns_error() {
        let error = Error::user("bad");
        let f = Future::<i32>::err(error.clone());
        assert_eq!(f.await_result(Duration::from_secs(1)), Err(error));
    }

    #[test]
    fn huge_timeout_does_not_overflow() {
        let f = Future::ok(());
        assert_eq!(f.await_result(Duration::MAX), Ok(()));
    }
}
