//! Core conversation state machine
//!
//! A pure mapping from (current state, inbound text) to (next state, reply).
//! Loading and persisting state is the runtime's job.

pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use state::{ConvState, Step};
pub use transition::{replay, transition, TransitionResult};
