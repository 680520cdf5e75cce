//! Test utilities for pledge.
//!
//! This module provides shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Bounded receive and wait helpers, so a broken test fails instead of
//!   hanging
//! - Outcome assertion macros

use crate::future::Future;
use crate::types::Outcome;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard, Once};
use std::time::Duration;

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Upper bound for any single wait in a unit test.
pub const TEST_WAIT: Duration = Duration::from_secs(5);

/// Installs a trace-level test subscriber. Only the first call has effect.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Acquire the global environment lock for tests that mutate env vars.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Receives one message, failing the test after [`TEST_WAIT`].
#[track_caller]
pub(crate) fn recv<T>(rx: &Receiver<T>) -> T {
    match rx.recv_timeout(TEST_WAIT) {
        Ok(v) => v,
        Err(e) => panic!("no message within {TEST_WAIT:?}: {e}"),
    }
}

/// Waits for `future` to settle, failing the test after [`TEST_WAIT`].
#[track_caller]
pub(crate) fn settle<T: Clone + Send + 'static>(future: &Future<T>) -> Outcome<T> {
    match future.inner().wait(TEST_WAIT) {
        Some(outcome) => outcome,
        None => panic!("{future:?} still pending after {TEST_WAIT:?}"),
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
}

/// Assert that an outcome is Cancelled.
#[macro_export]
macro_rules! assert_outcome_cancelled {
    ($outcome:expr) => {
        match $outcome {
            $crate::types::Outcome::Cancelled => {}
            other => unreachable!("expected Outcome::Cancelled, got {:?}", other),
        }
    };
}

