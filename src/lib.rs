//! Pledge: thread-safe futures with callbacks, combinators and cancellation.
//!
//! # Overview
//!
//! A [`Future`] is a write-once result cell shared between the code that
//! produces a value and any number of observers. It settles exactly once, as
//! succeeded, failed, or cancelled, and every callback registered on it runs
//! at most once on the future's execution context.
//!
//! # Core Guarantees
//!
//! - **Exactly once**: concurrent completers race; one wins, the rest get `false`
//! - **No lost callbacks**: a listener registered after settlement still fires
//! - **Off-thread dispatch**: callbacks run on an [`Executor`], never under a lock
//! - **Cancellation flows upstream**: cancelling a derived future cancels its sources
//! - **Errors pass through**: combinators forward failures untouched until a `recover`
//!
//! # Module Structure
//!
//! - [`future`]: the [`Future`] handle, completion classifier, listeners
//! - [`combinator`]: transform, recover, timeout, re-contextualization, sequence
//! - [`blocking`]: blocking await with a timeout
//! - [`executor`]: execution contexts (worker pool, dispatch queues, foreground)
//! - [`time`]: timer heap and timer service thread
//! - [`adapter`]: serial-context and schedulable-operation adapters
//! - [`types`]: identifiers, outcomes, states
//! - [`config`]: pool configuration from code, environment, or TOML
//! - [`error`]: error types
//!
//! # Example
//!
//! ```
//! use pledge::{sequence, Future};
//! use std::time::Duration;
//!
//! let a = Future::spawn(|| Ok(2));
//! let b = a.transform(|v| Ok(v * 10));
//! let all = sequence(vec![a, b]);
//! assert_eq!(all.await_result(Duration::from_secs(1)), Ok(vec![2, 20]));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod adapter;
pub mod blocking;
pub mod combinator;
pub mod config;
pub mod error;
pub mod executor;
pub mod future;
pub mod time;
pub mod tracing_compat;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenient access to core types
pub use adapter::{FutureOperation, SerialContext, SerialContextHandle};
pub use blocking::await_result;
pub use combinator::{sequence, sequence_on};
pub use config::PoolConfig;
pub use error::{ConfigError, Error, ErrorKind, Result};
pub use executor::{
    default_executor, foreground, init_default_pool, DispatchQueue, Executor, ForegroundQueue,
    Job, WorkerPool,
};
pub use future::{Completion, Future, IntoCompletion};
pub use types::{FutureId, FutureState, Outcome};
