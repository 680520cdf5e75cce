#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

use pledge::{Future, Outcome};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::sync::mpsc::Receiver;
use std::sync::Once;
use std::time::{Duration, Instant};

static INIT_LOGGING: Once = Once::new();

/// Upper bound for any single wait in an integration test.
pub const TEST_WAIT: Duration = Duration::from_secs(5);

/// Seed used under CI when `PLEDGE_PROPTEST_SEED` is unset.
const CI_PROPTEST_SEED: u64 = 0x5EED_5EED;

/// Proptest config for `cases` cases.
///
/// `PLEDGE_PROPTEST_SEED` pins the RNG seed, as does running under `CI`;
/// an explicit `PROPTEST_RNG_SEED` still wins. `PLEDGE_PROPTEST_MAX_SHRINK_ITERS`
/// caps shrinking.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    let seed = match std::env::var("PLEDGE_PROPTEST_SEED") {
        Ok(value) => value.parse::<u64>().ok(),
        Err(_) => std::env::var_os("CI").map(|_| CI_PROPTEST_SEED),
    };
    if let Some(seed) = seed.filter(|_| matches!(config.rng_seed, RngSeed::Random)) {
        config.rng_seed = RngSeed::Fixed(seed);
    }
    if let Some(iters) = std::env::var("PLEDGE_PROPTEST_MAX_SHRINK_ITERS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
    {
        config.max_shrink_iters = iters;
    }
    config
}

/// Installs a trace-level test subscriber once per test binary.
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

/// Receives one message, failing the test after [`TEST_WAIT`].
#[track_caller]
pub fn recv<T>(rx: &Receiver<T>) -> T {
    match rx.recv_timeout(TEST_WAIT) {
        Ok(v) => v,
        Err(e) => panic!("no message within {TEST_WAIT:?}: {e}"),
    }
}

/// Waits for `future` to settle and returns its outcome.
///
/// Fails the test if the future is still pending after [`TEST_WAIT`].
#[track_caller]
pub fn settle<T: Clone + Send + 'static>(future: &Future<T>) -> Outcome<T> {
    let _ = future.await_result(TEST_WAIT);
    match future.outcome() {
        Some(outcome) => outcome,
        None => panic!("{future:?} still pending after {TEST_WAIT:?}"),
    }
}

/// Polls `condition` until it holds, failing the test after `timeout`.
#[track_caller]
pub fn wait_until(description: &str, timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "condition '{description}' not met within {timeout:?}"
        );
        std::thread::sleep(Duration::from_millis(1));
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

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Assert that an outcome is Ok with a specific value.
#[macro_export]
macro_rules! assert_outcome_ok {
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            ::pledge::Outcome::Ok(v) => assert_eq!(v, $expected),
            other => unreachable!("expected Outcome::Ok({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that an outcome is Cancelled.
#[macro_export]
macro_rules! assert_outcome_cancelled {
    ($outcome:expr) => {
        match $outcome {
            ::pledge::Outcome::Cancelled => {}
            other => unreachable!("expected Outcome::Cancelled, got {:?}", other),
        }
    };
}

