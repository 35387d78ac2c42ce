//! Live preview of one script
//!
//! A [`Preview`] runs two tasks: the session actor, which owns the
//! [`Session`](crate::session::Session) and applies commands in arrival
//! order, and the recompile coordinator, which compiles source edits one at a
//! time. Both must be spawned inside a tokio runtime.

pub(crate) mod actor;

use crate::bridge::{DisplaySurface, InboundMessage, OutboundMessage, ReadyGate, decode_inbound};
use crate::compiler::Compiler;
use crate::error::{PreviewError, ProtocolError};
use crate::navigation::{self, JumpTarget, Position};
use crate::recompile::{RecompileCoordinator, SourceRequest};
use crate::types::{Action, ErrorInfo, State};
use actor::{SessionCommand, spawn_session_actor};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Handle to a running preview session
pub struct Preview {
    commands: mpsc::Sender<SessionCommand>,
    sources: watch::Sender<Option<SourceRequest>>,
    gate: ReadyGate,
    surface: Arc<dyn DisplaySurface>,
}

impl Preview {
    /// Spawn the session actor and the recompile coordinator
    pub fn spawn(
        compiler: Arc<dyn Compiler>,
        surface: Arc<dyn DisplaySurface>,
        live_update_default: bool,
    ) -> Self {
        let gate = ReadyGate::new();
        let handles = spawn_session_actor(Arc::clone(&surface), gate.clone(), live_update_default);
        let (sources, source_rx) = watch::channel(None);

        let coordinator = RecompileCoordinator::new(
            compiler,
            handles.commands.clone(),
            source_rx,
            handles.live_update,
            gate.clone(),
        );
        tokio::spawn(coordinator.run());

        Self {
            commands: handles.commands,
            sources,
            gate,
            surface,
        }
    }

    /// Load a story from scratch
    ///
    /// The compile waits for the surface's `ready`; a story already running
    /// is replaced by a new session with an empty log.
    pub fn initialize_story(&self, source: impl Into<String>) {
        let text = source.into();
        self.sources.send_modify(|slot| {
            let epoch = slot.as_ref().map_or(0, |request| request.epoch) + 1;
            log::info!("Initializing story (epoch {})", epoch);
            *slot = Some(SourceRequest { text, epoch });
        });
    }

    /// Hand over edited source; it is compiled and replayed in the background
    pub fn on_source_changed(&self, source: impl Into<String>) {
        let text = source.into();
        self.sources.send_modify(|slot| {
            let epoch = slot.as_ref().map_or(0, |request| request.epoch);
            *slot = Some(SourceRequest { text, epoch });
        });
    }

    /// Mark the display surface as ready; only the first call has an effect
    pub fn ready(&self) -> bool {
        let opened = self.gate.open();
        if !opened {
            log::debug!("Ignoring repeated ready");
        }
        opened
    }

    /// Handle one raw inbound message from the display surface
    ///
    /// Unknown action kinds are recorded into the session's errors. Only
    /// messages that cannot be decoded at all are returned as errors.
    pub async fn handle_message(&self, raw: &str) -> Result<(), PreviewError> {
        let message = match decode_inbound(raw) {
            Ok(message) => message,
            Err(ProtocolError::UnknownAction { kind }) => {
                log::warn!("Unknown action kind {:?}", kind);
                return self
                    .dispatch(Action::RecordErrors {
                        errors: vec![ErrorInfo::unknown_action(&kind)],
                    })
                    .await;
            }
            Err(error) => {
                log::warn!("Dropping inbound message: {}", error);
                return Err(error.into());
            }
        };

        match message {
            InboundMessage::Ready => {
                self.ready();
                Ok(())
            }
            InboundMessage::Action { action } => self.dispatch(action).await,
            InboundMessage::JumpTo { target } => {
                let reply = match self.jump_to(&target) {
                    Ok(position) => OutboundMessage::RevealPosition { position },
                    Err(error) => OutboundMessage::NavigationFailed {
                        message: error.to_string(),
                    },
                };
                if let Err(error) = self.surface.post(reply) {
                    log::warn!("Failed to post navigation result: {}", error);
                }
                Ok(())
            }
        }
    }

    /// Dispatch `action` once the session is free
    ///
    /// Waits behind an in-flight recompile. After dispose this is a no-op.
    pub async fn dispatch(&self, action: Action) -> Result<(), PreviewError> {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Dispatch { action, reply })
            .await
            .is_err()
        {
            log::debug!("Session gone, dispatch ignored");
            return Ok(());
        }
        match response.await {
            Ok(result) => Ok(result?),
            Err(_) => Ok(()),
        }
    }

    /// Current session state, or `None` once disposed
    pub async fn state(&self) -> Option<State> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::GetState { reply })
            .await
            .ok()?;
        response.await.ok()
    }

    /// Resolve `target` against the latest source text
    pub fn jump_to(&self, target: &JumpTarget) -> Result<Position, PreviewError> {
        let sources = self.sources.borrow();
        let document = sources
            .as_ref()
            .map(|request| request.text.as_str())
            .unwrap_or_default();
        Ok(navigation::jump_to(document, target)?)
    }

    /// Stop the session; later calls become no-ops
    pub async fn dispose(&self) {
        log::info!("Disposing preview");
        self.gate.close();
        let _ = self.commands.send(SessionCommand::Dispose).await;
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }
}

impl std::fmt::Debug for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("ready", &self.gate.is_open())
            .finish_non_exhaustive()
    }
}
