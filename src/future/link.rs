//! Upstream cancellation links.
//!
//! A derived future remembers the futures it was computed from so that
//! cancelling it can be forwarded upstream. Links are weak: a derived future
//! never keeps its sources alive, and a source that is already gone simply
//! has nothing left to cancel.

use crate::tracing_compat::debug;
use crate::types::FutureId;
use smallvec::SmallVec;
use std::sync::Weak;

/// Type-erased view of a future that can be cancelled.
pub(crate) trait Cancel: Send + Sync {
    /// Cancels the future if it is still pending.
    ///
    /// Returns true if this call made the transition.
    fn cancel(&self) -> bool;

    /// The id of the linked future.
    fn id(&self) -> FutureId;
}

/// The ordered set of futures a future was derived from.
///
/// Almost every future has zero or one link; only sequencing fans out.
#[derive(Default)]
pub(crate) struct Upstream {
    links: SmallVec<[Weak<dyn Cancel>; 1]>,
}

impl Upstream {
    pub(crate) fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub(crate) fn push(&mut self, link: Weak<dyn Cancel>) {
        self.links.push(link);
    }

    /// Drops every link and keeps only `link`.
    pub(crate) fn replace(&mut self, link: Weak<dyn Cancel>) {
        self.links.clear();
        self.links.push(link);
    }

    /// Forwards cancellation to every live link, in link order.
    ///
    /// Returns the number of links that transitioned.
    pub(crate) fn cancel_all(self, from: FutureId) -> usize {
        let mut forwarded = 0;
        for link in self.links {
            if let Some(parent) = link.upgrade() {
                if parent.cancel() {
                    debug!(
                        future_id = %from,
                        parent_id = %parent.id(),
                        "cancellation forwarded upstream"
                    );
                    forwarded += 1;
                }
            }
        }
        forwarded
    }
}
