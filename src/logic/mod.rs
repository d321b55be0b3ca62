//! Game logic scheduling
//!
//! Behavior is composed from small named callbacks, each running at its own
//! interval, instead of one monolithic update function.

mod scheduler;

pub use scheduler::{Interval, LogicError, LogicFailure, LogicScheduler, TickReport};
