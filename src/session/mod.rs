//! Session state machine: action log, reducer and controller

pub mod action_log;
pub mod controller;
pub mod reducer;

pub use action_log::ActionLog;
pub use controller::{Session, StateObserver};
pub use reducer::{Outcome, apply};
