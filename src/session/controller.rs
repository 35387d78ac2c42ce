//! Owns one story instance and the action log driving it

use super::action_log::ActionLog;
use super::reducer::{self, Outcome};
use crate::error::SessionError;
use crate::runtime::RuntimeAdapter;
use crate::types::{Action, State};

/// Called with the new state after every successful change
pub type StateObserver = Box<dyn FnMut(&State) + Send>;

/// The session state machine
///
/// `state` is always what replaying `log` against a fresh instance of the
/// current story produces. The runtime adapter is owned here and only here;
/// recompiles swap it wholesale.
pub struct Session {
    adapter: Option<Box<dyn RuntimeAdapter>>,
    log: ActionLog,
    state: State,
    live_update_default: bool,
    /// Log position of the first choice the current story rejected on replay
    diverged_at: Option<usize>,
    observer: Option<StateObserver>,
    disposed: bool,
}

impl Session {
    /// A session with no story loaded yet
    pub fn new(live_update_default: bool) -> Self {
        Self {
            adapter: None,
            log: ActionLog::new(),
            state: State::new(live_update_default),
            live_update_default,
            diverged_at: None,
            observer: None,
            disposed: false,
        }
    }

    pub fn with_adapter(adapter: Box<dyn RuntimeAdapter>, live_update_default: bool) -> Self {
        let mut session = Self::new(live_update_default);
        session.adapter = Some(adapter);
        session
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    pub fn has_story(&self) -> bool {
        self.adapter.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Whether the last replay stopped applying choices
    pub fn is_diverged(&self) -> bool {
        self.diverged_at.is_some()
    }

    /// Register the observer, replacing any previous one
    pub fn set_on_state_change(&mut self, observer: StateObserver) {
        self.observer = Some(observer);
    }

    /// Start a new session on `adapter`: reset, then dispatch `Start`
    pub fn begin(&mut self, adapter: Box<dyn RuntimeAdapter>) -> Result<(), SessionError> {
        if self.disposed {
            return Ok(());
        }
        log::info!("Beginning session");
        self.adapter = Some(adapter);
        self.log.clear();
        self.state = State::new(self.live_update_default);
        self.diverged_at = None;
        self.dispatch(Action::Start)
    }

    /// Log `action` and fold it onto the state
    pub fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        if self.disposed {
            log::debug!("Session disposed, dropping {}", action.kind());
            return Ok(());
        }

        if let Action::Rewind = action {
            self.rewind()?;
            return Ok(());
        }

        if action.affects_choice()
            && let Some(position) = self.diverged_at.take()
        {
            // A fresh choice at the divergence point supersedes the stale ones
            log::info!(
                "Dropping stale choices from log position {} before {}",
                position,
                action.kind()
            );
            self.log.drop_choices_from(position);
            self.rebuild()?;
        }

        let state = self.state.clone();
        let (state, outcome) = match self.adapter.as_deref_mut() {
            Some(adapter) => match reducer::apply(state, &action, adapter) {
                Ok(applied) => applied,
                Err(error) => {
                    log::warn!("Runtime failure while applying {}: {}", action.kind(), error);
                    return Err(error.into());
                }
            },
            None if matches!(action, Action::Start | Action::SelectChoice { .. }) => {
                return Err(SessionError::NoStory);
            }
            None => reducer::annotate(state, &action),
        };
        self.state = state;

        match outcome {
            // Replaying the rejected choice against a moved story could apply
            // it, so the log keeps the error it produced instead
            Outcome::InvalidChoice => {
                let errors = self.state.errors.last().cloned().into_iter().collect();
                self.log.push(Action::RecordErrors { errors });
            }
            _ => self.log.push(action),
        }

        self.notify();
        Ok(())
    }

    /// Undo the last applied choice by replaying the log without it
    ///
    /// Returns false when there is no choice to undo.
    pub fn rewind(&mut self) -> Result<bool, SessionError> {
        if self.disposed {
            return Ok(false);
        }

        let end = self.diverged_at.unwrap_or(self.log.len());
        let Some(position) = self.log.last_choice_before(end) else {
            log::debug!("Nothing to rewind");
            return Ok(false);
        };

        log::info!(
            "Rewinding to log position {} ({} actions dropped)",
            position,
            self.log.len() - position
        );
        self.log.truncate(position);
        self.replay()?;
        Ok(true)
    }

    /// Swap in a recompiled story and replay the log against it
    ///
    /// A successful compile supersedes the compile errors of earlier ones.
    pub fn replace(&mut self, adapter: Box<dyn RuntimeAdapter>) -> Result<(), SessionError> {
        if self.disposed {
            return Ok(());
        }
        self.log.drop_compile_errors();
        log::info!("Replacing story, replaying {} actions", self.log.len());
        self.adapter = Some(adapter);
        self.replay()
    }

    /// Rebuild the state from an empty one by folding the whole log
    ///
    /// The first choice the story does not offer records one `InvalidChoice`
    /// error and stops all later choices from being applied; everything else
    /// in the log still is.
    pub fn replay(&mut self) -> Result<(), SessionError> {
        if self.disposed {
            return Ok(());
        }
        self.rebuild()?;
        self.notify();
        Ok(())
    }

    /// Clear the log and the state, keeping the story
    pub fn reset(&mut self) {
        if self.disposed {
            return;
        }
        self.log.clear();
        self.state = State::new(self.live_update_default);
        self.diverged_at = None;
        self.notify();
    }

    /// Release the story; every later call is a no-op
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::info!("Disposing session after {} actions", self.log.len());
        self.disposed = true;
        self.adapter = None;
        self.observer = None;
    }

    fn rebuild(&mut self) -> Result<(), SessionError> {
        let mut adapter = self.adapter.as_ref().map(|adapter| adapter.fresh());
        let mut state = State::new(self.live_update_default);
        let mut diverged_at = None;

        for (position, action) in self.log.iter().enumerate() {
            if diverged_at.is_some() && action.affects_choice() {
                continue;
            }
            let (next, outcome) = match adapter.as_deref_mut() {
                Some(adapter) => reducer::apply(state, action, adapter)?,
                None => reducer::annotate(state, action),
            };
            state = next;
            if outcome == Outcome::InvalidChoice {
                log::info!(
                    "Replay diverged at log position {}, later choices skipped",
                    position
                );
                diverged_at = Some(position);
            }
        }

        if adapter.is_some() {
            self.adapter = adapter;
        }
        self.state = state;
        self.diverged_at = diverged_at;
        Ok(())
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.state);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_story", &self.adapter.is_some())
            .field("log", &self.log)
            .field("state", &self.state)
            .field("diverged_at", &self.diverged_at)
            .field("disposed", &self.disposed)
            .finish()
    }
}
