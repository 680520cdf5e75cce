//! Core types shared by the engine.
//!
//! - [`id`]: the [`FutureId`] every future is tagged with
//! - [`outcome`]: the three-valued terminal [`Outcome`] and the observable
//!   [`FutureState`]

pub mod id;
pub mod outcome;

pub use id::FutureId;
pub use outcome::{FutureState, Outcome};
