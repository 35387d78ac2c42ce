//! Errors as they are shown to the user

use serde::{Deserialize, Serialize};

/// Category of a recorded error
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Script did not compile
    Compile,
    /// An included script could not be loaded
    IncludeLoad,
    /// A choice index that the story does not offer
    InvalidChoice,
    /// Inbound message carried an action we do not know
    UnknownAction,
}

impl ErrorKind {
    /// Produced by compiling a script rather than by playing it
    pub fn is_compile(self) -> bool {
        matches!(self, ErrorKind::Compile | ErrorKind::IncludeLoad)
    }
}

/// An error captured into session state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based source line, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<usize>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn invalid_choice(index: usize, available: usize) -> Self {
        let message = if available == 0 {
            format!("Choice {index} is not available: the story offers no choices here")
        } else {
            format!(
                "Choice {index} is not available (0-{})",
                available.saturating_sub(1)
            )
        };
        Self::new(ErrorKind::InvalidChoice, message)
    }

    pub fn unknown_action(kind: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::UnknownAction,
            format!("Unknown action '{}'", kind.as_ref()),
        )
    }
}
