//! Gathering many futures into one.
//!
//! The aggregate succeeds with every value in input order once all members
//! succeed. The first member to fail fails the aggregate with that error; a
//! member that is cancelled fails the aggregate with [`Error::cancelled`].
//! Neither case touches the remaining members. Cancelling the aggregate
//! cancels every member still pending.

use crate::error::Error;
use crate::executor::{self, Executor};
use crate::future::Future;
use crate::tracing_compat::trace;
use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Gathers `futures` into a future of their values, in input order.
///
/// The aggregate runs its callbacks on the default pool. An empty input
/// yields a future that has already succeeded with an empty vector.
pub fn sequence<T, I>(futures: I) -> Future<Vec<T>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    sequence_on(executor::default_executor(), futures)
}

/// Like [`sequence`], with the aggregate's callbacks running on `executor`.
pub fn sequence_on<T, I>(executor: Arc<dyn Executor>, futures: I) -> Future<Vec<T>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    let members: Vec<Future<T>> = futures.into_iter().collect();
    let aggregate = Future::new_on(executor);
    if members.is_empty() {
        aggregate.try_success(Vec::new());
        return aggregate;
    }
    for member in &members {
        aggregate.link_upstream(member);
    }
    trace!(
        future_id = %aggregate.id(),
        members = members.len(),
        "sequencing futures"
    );

    let slots: Arc<Mutex<Vec<Option<T>>>> =
        Arc::new(Mutex::new((0..members.len()).map(|_| None).collect()));
    let remaining = Arc::new(AtomicUsize::new(members.len()));

    for (index, member) in members.iter().enumerate() {
        let target = aggregate.clone();
        let slots = Arc::clone(&slots);
        let remaining = Arc::clone(&remaining);
        member.subscribe(move |outcome| match outcome {
            Outcome::Ok(value) => {
                slots.lock()[index] = Some(value);
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let values: Option<Vec<T>> =
                        slots.lock().iter_mut().map(Option::take).collect();
                    if let Some(values) = values {
                        target.try_success(values);
                    }
                }
            }
            Outcome::Err(error) => {
                target.try_fail(error);
            }
            Outcome::Cancelled => {
                target.try_fail(Error::cancelled());
            }
        });
    }
    aggregate
}
