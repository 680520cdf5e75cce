//! Combinators deriving new futures from existing ones.
//!
//! - [`transform`]: map a success into a new completion, or recover from a
//!   failure
//! - [`timeout`]: bound the time to settle with a deadline
//! - [`context`]: observe a future from a different execution context
//! - [`sequence`](mod@sequence): gather many futures into one ordered vector
//!
//! Every derived future keeps a weak link to its source(s), so cancelling
//! the derived future cancels what it was computed from.

pub mod context;
pub mod sequence;
pub mod timeout;
pub mod transform;

pub use sequence::{sequence, sequence_on};
