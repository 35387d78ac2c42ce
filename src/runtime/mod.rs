//! Runtime execution engine for compiled scripts
//!
//! `run_until_choice` executes nodes from a cursor until the story offers a
//! choice or ends, collecting everything it produced into a `Passage`.

use crate::error::RuntimeError;
use crate::types::{
    ast::{Ast, AstNode},
    passage::{FunctionEvent, Passage, TranscriptEntry},
};

pub mod adapter;
pub mod cursor;

pub use adapter::{RuntimeAdapter, ScriptRuntime};
pub use cursor::{Cursor, Value, VariableError};


/// Default node budget for one continue
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Advance until the next choice or the end of the script
///
/// Returns an empty passage when the cursor is already waiting on a choice.
/// Executing more than `max_steps` nodes is an error; it means the script
/// loops without ever reaching a choice.
pub fn run_until_choice(
    cursor: &mut Cursor,
    ast: &Ast,
    max_steps: usize,
) -> Result<Passage, RuntimeError> {
    let start_pc = cursor.pc;
    let mut passage = Passage::new();

    if cursor.waiting_for_choice() {
        log::debug!("Waiting for choice at PC={}, not advancing", cursor.pc);
        return Ok(passage);
    }

    let mut steps = 0;
    while let Some(node) = ast.node(cursor.pc) {
        if steps == max_steps {
            log::warn!(
                "Step limit {} hit between PC={} and PC={}",
                max_steps,
                start_pc,
                cursor.pc
            );
            return Err(RuntimeError::StepLimitExceeded { limit: max_steps });
        }
        steps += 1;

        log::trace!("Executing PC={} node={:?}", cursor.pc, node);
        if !execute_node(cursor, node, &mut passage, ast) {
            break;
        }
    }

    if cursor.pc >= ast.len() {
        log::debug!("Reached end of program at PC={}", cursor.pc);
    }

    Ok(passage)
}

/// Take choice `index` of the pending branch and jump to its target
pub fn select_choice(cursor: &mut Cursor, ast: &Ast, index: usize) -> Result<(), RuntimeError> {
    let Some(choice) = cursor.pending_choices.get(index) else {
        return Err(RuntimeError::ChoiceOutOfRange {
            index,
            available: cursor.pending_choices.len(),
        });
    };

    // Targets were validated at link time
    if let Some(target_pc) = ast.label_index(&choice.target) {
        log::debug!(
            "Choice {} selected, jumping from PC={} to PC={} (label={})",
            index,
            cursor.pc,
            target_pc,
            choice.target
        );
        cursor.pc = target_pc;
    }
    cursor.pending_choices.clear();

    Ok(())
}

/// Execute one node; returns whether execution should keep going
fn execute_node(cursor: &mut Cursor, node: &AstNode, passage: &mut Passage, ast: &Ast) -> bool {
    match node {
        AstNode::Say { speaker, text } => {
            passage
                .entries
                .push(TranscriptEntry::text(speaker.clone(), text.clone()));
            cursor.pc += 1;
            true
        }
        AstNode::ShowImage { layer, name } => {
            passage.entries.push(TranscriptEntry::tag(
                "show_image",
                Some(format!("{}:{}", layer, name)),
            ));
            cursor.pc += 1;
            true
        }
        AstNode::PlayBgm { name } => {
            passage
                .entries
                .push(TranscriptEntry::tag("play_bgm", Some(name.clone())));
            cursor.pc += 1;
            true
        }
        AstNode::PlaySe { name } => {
            passage
                .entries
                .push(TranscriptEntry::tag("play_se", Some(name.clone())));
            cursor.pc += 1;
            true
        }
        AstNode::PlayMovie { name } => {
            passage
                .entries
                .push(TranscriptEntry::tag("play_movie", Some(name.clone())));
            cursor.pc += 1;
            true
        }
        AstNode::Wait { seconds } => {
            passage
                .entries
                .push(TranscriptEntry::tag("wait", Some(seconds.to_string())));
            cursor.pc += 1;
            true
        }
        AstNode::ClearLayer { layer } => {
            passage
                .entries
                .push(TranscriptEntry::tag("clear_layer", Some(layer.clone())));
            cursor.pc += 1;
            true
        }
        AstNode::Branch { choices } => {
            log::debug!(
                "Presenting {} choices at PC={}",
                choices.len(),
                cursor.pc
            );
            cursor.pending_choices = choices.clone();
            cursor.pc += 1;
            false
        }
        AstNode::Jump { label } => {
            match ast.label_index(label) {
                Some(target_pc) => {
                    log::debug!(
                        "Jumping from PC={} to PC={} (label={})",
                        cursor.pc,
                        target_pc,
                        label
                    );
                    cursor.pc = target_pc;
                }
                None => cursor.pc += 1,
            }
            true
        }
        AstNode::JumpIf {
            var,
            cmp,
            value,
            label,
        } => {
            match cursor.check_condition(var, *cmp, value) {
                Ok(true) => match ast.label_index(label) {
                    Some(target_pc) => {
                        log::debug!(
                            "Condition {}={:?} {:?} {} holds, jumping to PC={} (label={})",
                            var,
                            cursor.get_var(var),
                            cmp,
                            value,
                            target_pc,
                            label
                        );
                        cursor.pc = target_pc;
                    }
                    None => cursor.pc += 1,
                },
                Ok(false) => cursor.pc += 1,
                Err(reason) => {
                    log::warn!("Cannot evaluate condition on '{}': {}", var, reason);
                    cursor.pc += 1;
                }
            }
            true
        }
        AstNode::Set { name, value } => {
            log::trace!("Setting {}={}", name, value);
            cursor.set_var(name.as_str(), value);
            cursor.pc += 1;
            true
        }
        AstNode::Modify { name, op, value } => {
            if let Err(reason) = cursor.modify_var(name, *op, value) {
                log::warn!("MODIFY {} {:?} {} skipped: {}", name, op, value, reason);
            }
            cursor.pc += 1;
            true
        }
        AstNode::Label { .. } => {
            cursor.pc += 1;
            true
        }
        AstNode::Call { name, args } => {
            passage.events.push(FunctionEvent {
                name: name.clone(),
                args: args.clone(),
            });
            cursor.pc += 1;
            true
        }
        AstNode::Include { name } => {
            log::warn!("Unresolved include '{}' at PC={} ignored", name, cursor.pc);
            cursor.pc += 1;
            true
        }
    }
}
