//! Terminal outcomes and observable states.
//!
//! A future moves exactly once from pending into one of three terminal
//! outcomes:
//!
//! - `Ok(T)`: succeeded with a value
//! - `Err(Error)`: failed with an error
//! - `Cancelled`: cancelled before either of the above
//!
//! [`FutureState`] is the value-free view of the same thing, including the
//! pending state.

use crate::error::{Error, Result};
use core::fmt;

/// The terminal outcome of a future.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Succeeded with a value.
    Ok(T),
    /// Failed with an error.
    Err(Error),
    /// Cancelled.
    Cancelled,
}

impl<T> Outcome<T> {
    /// Returns true if this outcome is `Ok`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns true if this outcome is `Err`.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// Returns true if this outcome is `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The state this outcome corresponds to.
    #[must_use]
    pub const fn state(&self) -> FutureState {
        match self {
            Self::Ok(_) => FutureState::Succeeded,
            Self::Err(_) => FutureState::Failed,
            Self::Cancelled => FutureState::Cancelled,
        }
    }

    /// Converts to a `Result`, reporting cancellation as [`Error::cancelled`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(e),
            Self::Cancelled => Err(Error::cancelled()),
        }
    }

    /// Maps the success value using the provided function.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Err(e) => Outcome::Err(e),
            Self::Cancelled => Outcome::Cancelled,
        }
    }

    /// Returns the success value, if any.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error, if any.
    pub fn err(self) -> Option<Error> {
        match self {
            Self::Err(e) => Some(e),
            _ => None,
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::Err(e),
        }
    }
}

/// The observable state of a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FutureState {
    /// Not yet terminal.
    Pending,
    /// Terminal with a value.
    Succeeded,
    /// Terminal with an error.
    Failed,
    /// Terminal by cancellation.
    Cancelled,
}

impl FutureState {
    /// Returns true for every state except `Pending`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for FutureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Predicates
    // =========================================================================

    #[test]
    fn predicates() {
        let ok: Outcome<i32> = Outcome::Ok(1);
        let err: Outcome<i32> = Outcome::Err(Error::user("boom"));
        let cancelled: Outcome<i32> = Outcome::Cancelled;

        assert!(ok.is_ok() && !ok.is_err() && !ok.is_cancelled());
        assert!(err.is_err() && !err.is_ok());
        assert!(cancelled.is_cancelled() && !cancelled.is_ok());
    }

    #[test]
    fn state_mapping() {
        assert_eq!(Outcome::Ok(()).state(), FutureState::Succeeded);
        assert_eq!(Outcome::<()>::Err(Error::user("x")).state(), FutureState::Failed);
        assert_eq!(Outcome::<()>::Cancelled.state(), FutureState::Cancelled);
        assert!(!FutureState::Pending.is_terminal());
        assert!(FutureState::Cancelled.is_terminal());
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    #[test]
    fn into_result_reports_cancellation_as_error() {
        assert_eq!(Outcome::Ok(3).into_result(), Ok(3));
        let err = Outcome::<i32>::Cancelled.into_result().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn map_only_touches_success() {
        assert_eq!(Outcome::Ok(2).map(|v| v * 10), Outcome::Ok(20));
        let err: Outcome<i32> = Outcome::Err(Error::user("keep"));
        assert_eq!(err.clone().map(|v| v + 1), err);
        assert_eq!(Outcome::<i32>::Cancelled.map(|v| v + 1), Outcome::Cancelled);
    }

    #[test]
    fn from_result() {
        assert_eq!(Outcome::from(Ok::<_, Error>(5)), Outcome::Ok(5));
        assert!(Outcome::<i32>::from(Err(Error::user("e"))).is_err());
    }

    #[test]
    fn state_display() {
        assert_eq!(FutureState::Succeeded.to_string(), "succeeded");
        assert_eq!(FutureState::Pending.to_string(), "pending");
    }
}
