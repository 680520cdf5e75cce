//! Futures for work confined to a serial queue.
//!
//! Some resources, such as a transactional store's context, may only be
//! touched from one private serial queue. [`SerialContext`] lets such an
//! owner hand out futures whose block runs on that queue and whose callbacks
//! are drained there too.

use crate::executor::DispatchQueue;
use crate::future::{Future, IntoCompletion};
use std::fmt;

/// An owner of a private serial queue.
pub trait SerialContext {
    /// The queue all work for this context must run on.
    fn queue(&self) -> &DispatchQueue;

    /// Runs `block` on the context's queue and returns a future for its
    /// classified result. The future's callbacks also run on that queue.
    fn perform_future<T, F, R>(&self, block: F) -> Future<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce() -> R + Send + 'static,
        R: IntoCompletion<Output = T>,
    {
        Future::spawn_on(self.queue().executor(), block)
    }
}

/// A minimal [`SerialContext`] that owns its own serial queue.
#[derive(Clone)]
pub struct SerialContextHandle {
    queue: DispatchQueue,
}

impl SerialContextHandle {
    /// Creates a context with a fresh serial queue labelled `label`.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            queue: DispatchQueue::serial(label),
        }
    }
}

impl SerialContext for SerialContextHandle {
    fn queue(&self) -> &DispatchQueue {
        &self.queue
    }
}

impl fmt::Debug for SerialContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialContextHandle")
            .field("label", &self.queue.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_utils::{init_test_logging, recv, settle};
    use crate::types::Outcome;
    use std::sync::mpsc;

    #[test]
    fn block_and_callbacks_run_on_private_queue() {
        init_test_logging();
        let context = SerialContextHandle::new("test.store");
        let here = context.clone();
        let future = context.perform_future(move || Ok::<_, Error>(here.queue().is_current()));

        let (tx, rx) = mpsc::channel();
        let here = context.clone();
        future.on_success(move |ran_on_queue| {
            tx.send((ran_on_queue, here.queue().is_current())).unwrap();
        });
        assert_eq!(recv(&rx), (true, true));
    }

    #[test]
    fn blocks_run_in_submission_order() {
        let context = SerialContextHandle::new("test.store.serial");
        let futures: Vec<Future<usize>> = (0..10)
            .map(|i| {
                context.perform_future(move || {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    Ok::<_, Error>(i)
                })
            })
            .collect();
        let last = futures.last().cloned().unwrap();
        assert_eq!(settle(&last), Outcome::Ok(9));
        assert!(futures.iter().all(Future::is_success));
    }
}
