//! Preview state pushed to the display surface

use super::diagnostic::ErrorInfo;
use super::passage::{ChoiceView, FunctionEvent, TranscriptEntry};
use serde::{Deserialize, Serialize};

/// Everything the display surface needs to render a session
///
/// Derived by folding the action log; never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub transcript: Vec<TranscriptEntry>,
    pub choices: Vec<ChoiceView>,
    pub errors: Vec<ErrorInfo>,
    pub events: Vec<FunctionEvent>,
    pub live_update: bool,
    pub can_continue: bool,
    pub at_end: bool,
}

impl State {
    /// Empty state with the given live-update flag
    pub fn new(live_update: bool) -> Self {
        Self {
            transcript: Vec::new(),
            choices: Vec::new(),
            errors: Vec::new(),
            events: Vec::new(),
            live_update,
            can_continue: false,
            at_end: false,
        }
    }

    /// Text of every text entry in the transcript
    pub fn transcript_text(&self) -> Vec<&str> {
        self.transcript.iter().filter_map(|e| e.as_text()).collect()
    }

    /// Display text of the offered choices
    pub fn choice_texts(&self) -> Vec<&str> {
        self.choices.iter().map(|c| c.text.as_str()).collect()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new(true)
    }
}
