//! Classification of completion values.
//!
//! Anything that can finish a future is first classified into one of three
//! shapes: a plain value, an error, or another future to chain to. Producers
//! (spawned blocks, `transform`/`recover` mappers, operations) may return any
//! type implementing [`IntoCompletion`]:
//!
//! | returned type      | classified as          |
//! |--------------------|------------------------|
//! | `Ok(v)`            | [`Completion::Value`]  |
//! | `Err(e)`           | [`Completion::Error`]  |
//! | [`Future<T>`]      | [`Completion::Nested`] |
//! | [`Completion<T>`]  | itself                 |

use super::Future;
use crate::error::{Error, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A classified completion value.
pub enum Completion<T> {
    /// Succeed with this value.
    Value(T),
    /// Fail with this error.
    Error(Error),
    /// Chain to this future and take whatever outcome it reaches.
    Nested(Future<T>),
}

impl<T> Completion<T> {
    /// Returns true for [`Completion::Nested`].
    #[must_use]
    pub const fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }
}

impl<T> std::fmt::Debug for Completion<T>
where
    T: std::fmt::Debug + Clone + Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Error(e) => f.debug_tuple("Error").field(e).finish(),
            Self::Nested(fut) => f.debug_tuple("Nested").field(fut).finish(),
        }
    }
}

/// Conversion into a [`Completion`].
pub trait IntoCompletion {
    /// The success type of the completion.
    type Output;

    /// Classifies `self`.
    fn into_completion(self) -> Completion<Self::Output>;
}

impl<T> IntoCompletion for Completion<T> {
    type Output = T;

    fn into_completion(self) -> Completion<T> {
        self
    }
}

impl<T> IntoCompletion for Result<T> {
    type Output = T;

    fn into_completion(self) -> Completion<T> {
        match self {
            Ok(v) => Completion::Value(v),
            Err(e) => Completion::Error(e),
        }
    }
}

impl<T> IntoCompletion for Future<T> {
    type Output = T;

    fn into_completion(self) -> Completion<T> {
        Completion::Nested(self)
    }
}

/// Runs a producer, turning a panic into a failed completion.
pub(crate) fn produce<R, F>(producer: F) -> Completion<R::Output>
where
    F: FnOnce() -> R,
    R: IntoCompletion,
{
    match catch_unwind(AssertUnwindSafe(producer)) {
        Ok(r) => r.into_completion(),
        Err(payload) => Completion::Error(Error::user(format!(
            "producer panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "opaque panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_classify_by_variant() {
        assert!(matches!(Ok::<_, Error>(3).into_completion(), Completion::Value(3)));
        match Err::<i32, _>(Error::user("bad")).into_completion() {
            Completion::Error(e) => assert_eq!(e.message(), Some("bad")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn futures_classify_as_nested() {
        let inner = Future::<i32>::new();
        let c = inner.clone().into_completion();
        assert!(c.is_nested());
        match c {
            Completion::Nested(f) => assert!(f.ptr_eq(&inner)),
            _ => unreachable!(),
        }
    }

    #[test]
    fn panicking_producer_becomes_error() {
        let c = produce(|| -> Result<i32> { panic!("kaboom") });
        match c {
            Completion::Error(e) => {
                assert!(e.is_user());
                assert_eq!(e.message(), Some("producer panicked: kaboom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
