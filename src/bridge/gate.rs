//! One-shot readiness handshake

use crate::error::PreviewError;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Pending,
    Open,
    Closed,
}

/// Resolves once, when the display surface reports `ready`
///
/// Clones share the same gate. Closing it (on dispose) fails every waiter
/// that has not been let through.
#[derive(Debug, Clone)]
pub struct ReadyGate {
    state: Arc<watch::Sender<GateState>>,
}

impl ReadyGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::Pending);
        Self {
            state: Arc::new(state),
        }
    }

    /// Open the gate; returns false if it was already open or closed
    pub fn open(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == GateState::Pending {
                *state = GateState::Open;
                true
            } else {
                false
            }
        })
    }

    pub fn close(&self) {
        self.state.send_replace(GateState::Closed);
    }

    pub fn is_open(&self) -> bool {
        *self.state.borrow() == GateState::Open
    }

    /// Wait until the gate opens
    pub async fn wait(&self) -> Result<(), PreviewError> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| *state != GateState::Pending)
            .await
            .map_err(|_| PreviewError::Disposed)?;
        match *state {
            GateState::Open => Ok(()),
            _ => Err(PreviewError::Disposed),
        }
    }
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}
