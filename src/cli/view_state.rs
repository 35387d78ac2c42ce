//! View state for the terminal preview
//!
//! Tracks what has already been printed so each state update only prints
//! what is new. A transcript that no longer extends the printed one (after a
//! rewind or a recompile) is redrawn from the top.

use crate::types::{State, TranscriptEntry};
use std::collections::HashMap;

/// Clear the terminal screen (cross-platform)
pub fn clear_screen() {
    print!("\x1b[2J\x1b[H");

    // Fallback: print newlines
    if std::io::Write::flush(&mut std::io::stdout()).is_err() {
        for _ in 0..50 {
            println!();
        }
    }
}

/// What the terminal currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    shown: Vec<TranscriptEntry>,
    errors_shown: usize,
    /// Images currently displayed (layer -> name)
    images: HashMap<String, String>,
    bgm: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `state` into the view and return what needs printing
    pub fn apply_state(&mut self, state: &State) -> RenderDelta {
        let mut delta = RenderDelta::default();

        if !state.transcript.starts_with(&self.shown) {
            delta.redraw = true;
            self.shown.clear();
            self.images.clear();
            self.bgm = None;
            self.errors_shown = 0;
        }

        for entry in &state.transcript[self.shown.len()..] {
            if let Some(line) = self.render_entry(entry) {
                delta.lines.push(line);
            }
        }
        self.shown = state.transcript.clone();

        if state.errors.len() < self.errors_shown {
            self.errors_shown = 0;
        }
        delta.errors = state.errors[self.errors_shown..]
            .iter()
            .map(|error| match error.line {
                Some(line) => format!("line {}: {}", line, error.message),
                None => error.message.clone(),
            })
            .collect();
        self.errors_shown = state.errors.len();

        delta
    }

    fn render_entry(&mut self, entry: &TranscriptEntry) -> Option<String> {
        match entry {
            TranscriptEntry::Text {
                speaker: Some(speaker),
                text,
            } => Some(format!("{}:\n{}\n", speaker, text)),
            TranscriptEntry::Text { speaker: None, text } => Some(format!("{}\n", text)),
            TranscriptEntry::Tag { name, value } => {
                let value = value.clone().unwrap_or_default();
                match name.as_str() {
                    "show_image" => {
                        let (layer, image) = value.split_once(':').unwrap_or(("", value.as_str()));
                        if self.images.get(layer).map(String::as_str) == Some(image) {
                            return None;
                        }
                        self.images.insert(layer.to_string(), image.to_string());
                        Some(format!("  [ShowImage: {} ({})]", image, layer))
                    }
                    "clear_layer" => self
                        .images
                        .remove(&value)
                        .map(|_| format!("  [ClearLayer: {}]", value)),
                    "play_bgm" => {
                        if self.bgm.as_ref() == Some(&value) {
                            return None;
                        }
                        self.bgm = Some(value.clone());
                        Some(format!("  [PlayBGM: {}]", value))
                    }
                    // SE always triggers
                    "play_se" => Some(format!("  [PlaySE: {}]", value)),
                    _ => Some(format!("  [{}: {}]", name, value)),
                }
            }
        }
    }
}

/// Output for one state update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderDelta {
    /// Clear the screen before printing
    pub redraw: bool,
    pub lines: Vec<String>,
    pub errors: Vec<String>,
}

impl RenderDelta {
    pub fn is_empty(&self) -> bool {
        !self.redraw && self.lines.is_empty() && self.errors.is_empty()
    }
}

/// Render a delta to the console
pub fn render_delta(delta: &RenderDelta) {
    if delta.redraw {
        clear_screen();
    }
    for line in &delta.lines {
        println!("{}", line);
    }
    for error in &delta.errors {
        println!("[error] {}", error);
    }
}
