//! Folds one action onto a state snapshot

use crate::error::RuntimeError;
use crate::runtime::RuntimeAdapter;
use crate::types::{Action, ErrorInfo, Passage, State};

/// What applying an action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The story moved
    Advanced,
    /// Only state metadata changed
    Annotated,
    /// The choice was not offered; an error was recorded instead
    InvalidChoice,
    /// Nothing to do at this level
    Ignored,
}

/// Apply `action` to `state`, advancing `adapter` when the action moves the story
///
/// Given the same adapter position the result is always the same. An
/// unavailable choice never reaches the adapter. `Rewind` is the
/// controller's business and is ignored here.
pub fn apply(
    mut state: State,
    action: &Action,
    adapter: &mut dyn RuntimeAdapter,
) -> Result<(State, Outcome), RuntimeError> {
    match action {
        Action::Start => {
            adapter.start();
            state.transcript.clear();
            let passage = adapter.continue_until_choice()?;
            absorb(&mut state, passage, adapter);
            Ok((state, Outcome::Advanced))
        }
        Action::SelectChoice { index } => {
            let available = adapter.current_choices().len();
            if *index >= available {
                log::debug!("Choice {} rejected, {} available", index, available);
                state
                    .errors
                    .push(ErrorInfo::invalid_choice(*index, available));
                return Ok((state, Outcome::InvalidChoice));
            }
            let passage = adapter.choose(*index)?;
            absorb(&mut state, passage, adapter);
            Ok((state, Outcome::Advanced))
        }
        other => Ok(annotate(state, other)),
    }
}

/// Apply an action that never touches the story
pub fn annotate(mut state: State, action: &Action) -> (State, Outcome) {
    match action {
        Action::ToggleLiveUpdate { enabled } => {
            state.live_update = *enabled;
            (state, Outcome::Annotated)
        }
        Action::RecordErrors { errors } => {
            state.errors.extend(errors.iter().cloned());
            (state, Outcome::Annotated)
        }
        Action::RecordEvents { events } => {
            state.events.extend(events.iter().cloned());
            (state, Outcome::Annotated)
        }
        Action::Start | Action::SelectChoice { .. } | Action::Rewind => {
            log::trace!("{} has no effect without a story", action.kind());
            (state, Outcome::Ignored)
        }
    }
}

fn absorb(state: &mut State, passage: Passage, adapter: &dyn RuntimeAdapter) {
    state.transcript.extend(passage.entries);
    state.events.extend(passage.events);
    state.choices = adapter.current_choices();
    state.can_continue = adapter.can_continue();
    state.at_end = adapter.is_ended();
}
