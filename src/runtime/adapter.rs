//! The capability a session drives a story through

use super::{Cursor, DEFAULT_MAX_STEPS, run_until_choice, select_choice};
use crate::error::RuntimeError;
use crate::types::{
    ast::Ast,
    passage::{ChoiceView, Passage},
};
use std::sync::Arc;

/// One running instance of a compiled story
///
/// Implementations advance only through `start`, `continue_until_choice` and
/// `choose`. Errors returned from these are unexpected failures (resource
/// exhaustion and the like); an out-of-range choice is checked by callers
/// against `current_choices` before calling `choose`.
pub trait RuntimeAdapter: Send {
    /// Rewind to the beginning of the story
    fn start(&mut self);

    /// Run until the story offers choices or ends
    fn continue_until_choice(&mut self) -> Result<Passage, RuntimeError>;

    /// Choices offered at the current position, in order
    fn current_choices(&self) -> Vec<ChoiceView>;

    /// Take a choice and continue until the next one
    fn choose(&mut self, index: usize) -> Result<Passage, RuntimeError>;

    /// Whether more content can be produced without a choice
    fn can_continue(&self) -> bool;

    /// Whether the story has nothing more to produce
    fn is_ended(&self) -> bool;

    /// A new, unstarted instance of the same compiled story
    fn fresh(&self) -> Box<dyn RuntimeAdapter>;
}

/// `RuntimeAdapter` over a compiled markdown script
#[derive(Debug, Clone)]
pub struct ScriptRuntime {
    ast: Arc<Ast>,
    cursor: Cursor,
    max_steps: usize,
}

impl ScriptRuntime {
    pub fn new(ast: Ast) -> Self {
        Self::with_max_steps(ast, DEFAULT_MAX_STEPS)
    }

    pub fn with_max_steps(ast: Ast, max_steps: usize) -> Self {
        Self {
            ast: Arc::new(ast),
            cursor: Cursor::new(),
            max_steps,
        }
    }
}

impl RuntimeAdapter for ScriptRuntime {
    fn start(&mut self) {
        self.cursor = Cursor::new();
    }

    fn continue_until_choice(&mut self) -> Result<Passage, RuntimeError> {
        run_until_choice(&mut self.cursor, &self.ast, self.max_steps)
    }

    fn current_choices(&self) -> Vec<ChoiceView> {
        self.cursor
            .pending_choices
            .iter()
            .enumerate()
            .map(|(index, choice)| ChoiceView {
                index,
                text: choice.text.clone(),
            })
            .collect()
    }

    fn choose(&mut self, index: usize) -> Result<Passage, RuntimeError> {
        select_choice(&mut self.cursor, &self.ast, index)?;
        self.continue_until_choice()
    }

    fn can_continue(&self) -> bool {
        !self.cursor.waiting_for_choice() && self.cursor.pc < self.ast.len()
    }

    fn is_ended(&self) -> bool {
        !self.cursor.waiting_for_choice() && self.cursor.pc >= self.ast.len()
    }

    fn fresh(&self) -> Box<dyn RuntimeAdapter> {
        Box::new(Self {
            ast: Arc::clone(&self.ast),
            cursor: Cursor::new(),
            max_steps: self.max_steps,
        })
    }
}
