//! Terminal preview
//!
//! Plays a script in the terminal while the file is being edited. Every save
//! is recompiled and the current path through the story replayed.

use crate::{
    bridge::{ChannelSurface, OutboundMessage},
    cli::{
        compiler_for,
        view_state::{ViewState, render_delta},
        watcher::FileWatcher,
    },
    config::PreviewConfig,
    preview::Preview,
    types::{Action, State},
};
use anyhow::Context;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of player input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayCommand {
    /// 1-based choice number
    Choose(usize),
    Back,
    Restart,
    ToggleLive,
    Quit,
}

impl PlayCommand {
    fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "q" => Some(Self::Quit),
            "b" => Some(Self::Back),
            "s" => Some(Self::Restart),
            "l" => Some(Self::ToggleLive),
            other => other
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Self::Choose),
        }
    }
}

/// Run the terminal preview until the user quits
pub async fn run_play(script: &Path, config: &PreviewConfig, debug: bool) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read '{}'", script.display()))?;

    let (surface, mut updates) = ChannelSurface::new();
    let preview = Arc::new(Preview::spawn(
        compiler_for(script, config),
        Arc::new(surface),
        config.live_update,
    ));
    preview.initialize_story(source.clone());
    // The terminal is the display surface and is ready right away
    preview.ready();

    let watcher = tokio::spawn(
        FileWatcher::new(script)
            .with_seen(&source)
            .run(Arc::clone(&preview), config.poll_interval()),
    );

    println!("=== utsushi preview: {} ===", script.display());
    println!();
    println!("Controls:");
    println!("  1-9: select choice");
    println!("  b:   back");
    println!("  s:   restart");
    println!("  l:   toggle live update");
    println!("  q:   quit");
    println!();

    let mut view = ViewState::new();
    let mut latest: Option<State> = None;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(message) = updates.recv() => {
                if let OutboundMessage::UpdateState { state } = message {
                    render_delta(&view.apply_state(&state));
                    show_choices(&state);
                    if debug {
                        display_debug_info(&state);
                    }
                    latest = Some(state);
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let action = match PlayCommand::parse(&line) {
                    Some(PlayCommand::Quit) => break,
                    Some(PlayCommand::Choose(number)) => Action::SelectChoice { index: number - 1 },
                    Some(PlayCommand::Back) => Action::Rewind,
                    Some(PlayCommand::Restart) => Action::Start,
                    Some(PlayCommand::ToggleLive) => Action::ToggleLiveUpdate {
                        enabled: !latest.as_ref().is_none_or(|state| state.live_update),
                    },
                    None => {
                        println!("Invalid input. Enter a number, 'b', 's', 'l', or 'q'.");
                        continue;
                    }
                };
                if let Err(error) = preview.dispatch(action).await {
                    println!("[error] {}", error);
                }
            }
        }
    }

    watcher.abort();
    preview.dispose().await;
    println!("Goodbye!");
    Ok(())
}

fn show_choices(state: &State) {
    if !state.choices.is_empty() {
        println!("--- Choice ---");
        for choice in &state.choices {
            println!("{}. {}", choice.index + 1, choice.text);
        }
        println!();
        print!("Select (1-9): ");
        let _ = std::io::stdout().flush();
    } else if state.at_end {
        println!("== THE END ==");
        println!();
    }
}

/// Display debug information (only when --debug is set)
fn display_debug_info(state: &State) {
    println!("[debug]");
    println!("live_update={}", state.live_update);
    if !state.events.is_empty() {
        let events = serde_json::to_string(&state.events).unwrap_or_else(|_| "[]".to_string());
        println!("events={}", events);
    }
    println!();
}
