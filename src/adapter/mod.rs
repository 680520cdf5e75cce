//! Adapters bridging futures to other units of work.
//!
//! - [`serial_context`]: run a block on a context's private serial queue
//! - [`operation`]: wrap a future-producing block as a schedulable,
//!   cancellable operation

pub mod operation;
pub mod serial_context;

pub use operation::FutureOperation;
pub use serial_context::{SerialContext, SerialContextHandle};
