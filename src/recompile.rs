//! Turns source edits into story replacements
//!
//! One coordinator task runs per preview, so at most one compile is ever in
//! flight. Edits arriving meanwhile overwrite each other in a watch channel
//! and only the latest is compiled next.

use crate::bridge::ReadyGate;
use crate::compiler::Compiler;
use crate::preview::actor::SessionCommand;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Latest source text handed to the preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceRequest {
    pub text: String,
    /// Bumped by every `initialize_story`; a new epoch restarts the session
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy)]
struct Compiled {
    epoch: u64,
    fingerprint: md5::Digest,
}

pub(crate) struct RecompileCoordinator {
    compiler: Arc<dyn Compiler>,
    commands: mpsc::Sender<SessionCommand>,
    sources: watch::Receiver<Option<SourceRequest>>,
    live_update: watch::Receiver<bool>,
    gate: ReadyGate,
    /// Last source compiled, successfully or not
    compiled: Option<Compiled>,
    /// Epoch of the story the session is running
    loaded_epoch: Option<u64>,
}

impl RecompileCoordinator {
    pub(crate) fn new(
        compiler: Arc<dyn Compiler>,
        commands: mpsc::Sender<SessionCommand>,
        sources: watch::Receiver<Option<SourceRequest>>,
        live_update: watch::Receiver<bool>,
        gate: ReadyGate,
    ) -> Self {
        Self {
            compiler,
            commands,
            sources,
            live_update,
            gate,
            compiled: None,
            loaded_epoch: None,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let request = self.sources.borrow_and_update().clone();
            let live_update = *self.live_update.borrow_and_update();

            if let Some(request) = request
                && self.should_compile(&request, live_update)
                && !self.recompile(request).await
            {
                break;
            }

            let open = tokio::select! {
                changed = self.sources.changed() => changed.is_ok(),
                changed = self.live_update.changed() => changed.is_ok(),
            };
            if !open {
                break;
            }
        }
        log::debug!("Recompile coordinator stopped");
    }

    fn should_compile(&self, request: &SourceRequest, live_update: bool) -> bool {
        let Some(compiled) = self.compiled else {
            return true;
        };
        if compiled.epoch != request.epoch {
            return true;
        }
        if !live_update {
            log::debug!("Live update is off, holding source");
            return false;
        }
        if compiled.fingerprint == md5::compute(&request.text) {
            log::trace!("Source unchanged, skipping recompile");
            return false;
        }
        true
    }

    /// Compile `request` and hand the result to the session
    ///
    /// Returns false once the session is gone.
    async fn recompile(&mut self, request: SourceRequest) -> bool {
        if self.commands.send(SessionCommand::Hold).await.is_err() {
            return false;
        }
        if self.gate.wait().await.is_err() {
            log::debug!("Preview disposed before the surface was ready");
            return false;
        }
        // Edits made while waiting on the surface supersede this one
        let request = self
            .sources
            .borrow_and_update()
            .clone()
            .unwrap_or(request);

        // The session keeps the previous epoch's story until this one compiles
        let restart = self.loaded_epoch != Some(request.epoch);
        log::info!(
            "Compiling {} bytes of source (epoch {})",
            request.text.len(),
            request.epoch
        );
        let result = self.compiler.compile(&request.text).await;
        if result.is_ok() {
            self.loaded_epoch = Some(request.epoch);
        }
        self.compiled = Some(Compiled {
            epoch: request.epoch,
            fingerprint: md5::compute(&request.text),
        });

        self.commands
            .send(SessionCommand::Load { result, restart })
            .await
            .is_ok()
    }
}
