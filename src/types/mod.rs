//! Core types shared across the crate
//!
//! - AST: parsed and linked script
//! - Action: entries of a session's action log
//! - Passage: transcript entries, choices and function events a story produces
//! - State: the derived preview state pushed to the display surface
//! - ErrorInfo: errors as recorded into state

pub mod action;
pub mod ast;
pub mod diagnostic;
pub mod passage;
pub mod state;

pub use action::Action;
pub use ast::Ast;
pub use diagnostic::{ErrorInfo, ErrorKind};
pub use passage::{ChoiceView, FunctionEvent, Passage, TranscriptEntry};
pub use state::State;
