//! What a story produces when it advances

use serde::{Deserialize, Serialize};

/// One line of the preview transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TranscriptEntry {
    /// Dialogue or narration
    Text {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        speaker: Option<String>,
        text: String,
    },
    /// Presentation cue such as an image, music or a pause
    Tag {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        value: Option<String>,
    },
}

impl TranscriptEntry {
    pub fn text(speaker: Option<String>, text: impl Into<String>) -> Self {
        Self::Text {
            speaker,
            text: text.into(),
        }
    }

    pub fn tag(name: impl Into<String>, value: Option<String>) -> Self {
        Self::Tag {
            name: name.into(),
            value,
        }
    }

    /// Text content, if this is a text entry
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            Self::Tag { .. } => None,
        }
    }
}

/// A choice as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceView {
    /// Position in the current choice set, used by `SelectChoice`
    pub index: usize,
    pub text: String,
}

/// A call from the story into a host function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionEvent {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Output of one continue or choose
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Passage {
    pub entries: Vec<TranscriptEntry>,
    pub events: Vec<FunctionEvent>,
}

impl Passage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.events.is_empty()
    }
}
