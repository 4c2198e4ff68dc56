//! Core turn-taking state machine
//!
//! Implements the Elm Architecture pattern with pure phase transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{TurnGuards, TurnPhase};
pub use transition::{transition, TransitionError, TransitionResult};
