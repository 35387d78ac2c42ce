//! JSON-lines preview server
//!
//! Reads inbound messages from stdin and writes outbound ones to stdout, one
//! JSON object per line. Logs go to stderr.

use crate::{
    bridge::JsonLinesSurface,
    cli::{compiler_for, watcher::FileWatcher},
    config::PreviewConfig,
    preview::Preview,
};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Serve the preview until stdin closes
pub async fn run_serve(script: &Path, config: &PreviewConfig) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read '{}'", script.display()))?;

    let (surface, writer) = JsonLinesSurface::spawn(tokio::io::stdout());
    let preview = Arc::new(Preview::spawn(
        compiler_for(script, config),
        Arc::new(surface),
        config.live_update,
    ));
    preview.initialize_story(source.clone());

    let watcher = tokio::spawn(
        FileWatcher::new(script)
            .with_seen(&source)
            .run(Arc::clone(&preview), config.poll_interval()),
    );

    log::info!("Serving {}", script.display());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(error) = preview.handle_message(&line).await {
            log::warn!("{}", error);
        }
    }

    log::info!("stdin closed, shutting down");
    watcher.abort();
    let _ = watcher.await;
    preview.dispose().await;
    drop(preview);

    // The writer stops once every surface handle is gone
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
        Ok(Ok(result)) => result.context("Failed to write to stdout")?,
        Ok(Err(error)) => log::warn!("Writer task failed: {}", error),
        Err(_) => log::warn!("Timed out flushing output"),
    }
    Ok(())
}
