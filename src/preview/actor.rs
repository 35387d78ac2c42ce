//! Task that owns the session and applies commands one at a time

use crate::bridge::{DisplaySurface, OutboundMessage, ReadyGate};
use crate::error::{CompileErrors, SessionError};
use crate::runtime::RuntimeAdapter;
use crate::session::Session;
use crate::types::{Action, State};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_CAPACITY: usize = 32;

type Reply = oneshot::Sender<Result<(), SessionError>>;

pub(crate) enum SessionCommand {
    Dispatch {
        action: Action,
        reply: Reply,
    },
    /// A compile is about to start; queue dispatches until `Load`
    Hold,
    Load {
        result: Result<Box<dyn RuntimeAdapter>, CompileErrors>,
        /// Begin a new session instead of replaying the log
        restart: bool,
    },
    GetState {
        reply: oneshot::Sender<State>,
    },
    Dispose,
}

struct SessionActor {
    session: Session,
    gate: ReadyGate,
    holding: bool,
    queued: VecDeque<(Action, Reply)>,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                SessionCommand::Dispatch { action, reply } if self.holding => {
                    log::debug!("Recompile in flight, queueing {}", action.kind());
                    self.queued.push_back((action, reply));
                }
                SessionCommand::Dispatch { action, reply } => {
                    let result = self.dispatch(action);
                    let _ = reply.send(result);
                }
                SessionCommand::Hold => {
                    self.holding = true;
                }
                SessionCommand::Load { result, restart } => {
                    self.load(result, restart);
                    self.holding = false;
                    self.drain();
                }
                SessionCommand::GetState { reply } => {
                    let _ = reply.send(self.session.state().clone());
                }
                SessionCommand::Dispose => {
                    self.dispose();
                }
            }

            if self.session.is_disposed() {
                break;
            }
        }

        // Whatever is still queued was sent before the dispose
        for (action, reply) in self.queued.drain(..) {
            log::debug!("Dropping queued {} after dispose", action.kind());
            let _ = reply.send(Ok(()));
        }
        log::debug!("Session actor stopped");
    }

    fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        let result = self.session.dispatch(action);
        self.check(result)
    }

    fn load(&mut self, result: Result<Box<dyn RuntimeAdapter>, CompileErrors>, restart: bool) {
        let result = match result {
            Ok(adapter) if restart || !self.session.has_story() => self.session.begin(adapter),
            Ok(adapter) => self.session.replace(adapter),
            Err(errors) => {
                log::warn!("Compile failed, keeping the current story: {}", errors);
                self.session.dispatch(Action::RecordErrors {
                    errors: errors.to_error_infos(),
                })
            }
        };
        let _ = self.check(result);
    }

    fn drain(&mut self) {
        while !self.session.is_disposed()
            && let Some((action, reply)) = self.queued.pop_front()
        {
            let result = self.dispatch(action);
            let _ = reply.send(result);
        }
    }

    // Runtime failures are fatal to the session
    fn check(&mut self, result: Result<(), SessionError>) -> Result<(), SessionError> {
        match &result {
            Err(error @ SessionError::Runtime(_)) => {
                log::error!("Session failed, disposing: {}", error);
                self.dispose();
            }
            Err(error) => log::warn!("{}", error),
            Ok(()) => {}
        }
        result
    }

    fn dispose(&mut self) {
        self.session.dispose();
        self.gate.close();
    }
}

pub(crate) struct ActorHandles {
    pub commands: mpsc::Sender<SessionCommand>,
    pub live_update: watch::Receiver<bool>,
}

/// Spawn the actor for a new, empty session
///
/// Every state change is posted to `surface` as `updateState` and its
/// live-update flag published on the returned receiver.
pub(crate) fn spawn_session_actor(
    surface: Arc<dyn DisplaySurface>,
    gate: ReadyGate,
    live_update_default: bool,
) -> ActorHandles {
    let (commands, receiver) = mpsc::channel(COMMAND_CAPACITY);
    let (live_tx, live_update) = watch::channel(live_update_default);

    let mut session = Session::new(live_update_default);
    session.set_on_state_change(Box::new(move |state: &State| {
        if let Err(error) = surface.post(OutboundMessage::UpdateState {
            state: state.clone(),
        }) {
            log::warn!("Failed to post state update: {}", error);
        }
        live_tx.send_if_modified(|live| {
            let changed = *live != state.live_update;
            *live = state.live_update;
            changed
        });
    }));

    let actor = SessionActor {
        session,
        gate,
        holding: false,
        queued: VecDeque::new(),
    };
    tokio::spawn(actor.run(receiver));

    ActorHandles {
        commands,
        live_update,
    }
}
