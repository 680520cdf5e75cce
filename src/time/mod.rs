//! Delayed execution for deadline-bound futures.

mod timer;

pub use timer::{TimerHandle, TimerHeap, TimerService};
