//! Identifier types.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_FUTURE_ID: AtomicU64 = AtomicU64::new(1);

/// A process-unique identifier for a future.
///
/// Ids are handed out in creation order and never reused. They show up in
/// log records and `Debug` output so the life of one future can be followed
/// through a trace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FutureId(u64);

impl FutureId {
    /// Allocates the next id.
    #[must_use]
    pub(crate) fn next() -> Self {
        Self(NEXT_FUTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates an id from a raw value for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FutureId({})", self.0)
    }
}

impl fmt::Display for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_increasing_and_unique() {
        let a = FutureId::next();
        let b = FutureId::next();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_debug() {
        let id = FutureId::new_for_test(7);
        assert_eq!(id.to_string(), "F7");
        assert_eq!(format!("{id:?}"), "FutureId(7)");
        assert_eq!(id.as_u64(), 7);
    }
}
