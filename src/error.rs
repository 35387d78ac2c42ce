//! Error types

use crate::types::diagnostic::{ErrorInfo, ErrorKind};
use thiserror::Error;

/// A reason a script could not be compiled
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{}line {line}: {message}", file_prefix(.file))]
    Syntax {
        file: Option<String>,
        line: usize,
        message: String,
    },

    #[error("Undefined label '{label}' referenced in scenario")]
    UndefinedLabel { label: String },

    #[error("Duplicate label '{label}'")]
    DuplicateLabel { label: String },

    #[error("Failed to load include '{name}': {source}")]
    IncludeLoad {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Include cycle: '{name}' includes itself")]
    IncludeCycle { name: String },
}

fn file_prefix(file: &Option<String>) -> String {
    match file {
        Some(file) => format!("{file}: "),
        None => String::new(),
    }
}

impl CompileError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: None,
            line,
            message: message.into(),
        }
    }

    pub fn include_load(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::IncludeLoad {
            name: name.into(),
            source,
        }
    }

    /// Attribute a syntax error to an included file
    pub fn in_file(self, name: &str) -> Self {
        match self {
            Self::Syntax {
                file: None,
                line,
                message,
            } => Self::Syntax {
                file: Some(name.to_string()),
                line,
                message,
            },
            other => other,
        }
    }
}

impl From<&CompileError> for ErrorInfo {
    fn from(error: &CompileError) -> Self {
        match error {
            CompileError::Syntax {
                file: None, line, ..
            } => ErrorInfo::new(ErrorKind::Compile, error.to_string()).with_line(*line),
            CompileError::IncludeLoad { .. } => {
                ErrorInfo::new(ErrorKind::IncludeLoad, error.to_string())
            }
            _ => ErrorInfo::new(ErrorKind::Compile, error.to_string()),
        }
    }
}

/// Every error found while compiling one script
#[derive(Debug, Error)]
#[error("{} compile error(s): {}", .0.len(), join(.0))]
pub struct CompileErrors(pub Vec<CompileError>);

fn join(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CompileErrors {
    pub fn single(error: CompileError) -> Self {
        Self(vec![error])
    }

    pub fn to_error_infos(&self) -> Vec<ErrorInfo> {
        self.0.iter().map(ErrorInfo::from).collect()
    }
}

impl From<CompileError> for CompileErrors {
    fn from(error: CompileError) -> Self {
        Self::single(error)
    }
}

/// Failure inside a running story instance
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Story did not reach a choice or the end within {limit} steps")]
    StepLimitExceeded { limit: usize },

    #[error("Choice {index} out of range ({available} available)")]
    ChoiceOutOfRange { index: usize, available: usize },
}

/// Failure that ends a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("session has no story loaded")]
    NoStory,
}

/// Inbound message that could not be turned into a command
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown action '{kind}'")]
    UnknownAction { kind: String },
}

/// Source navigation failure, reported to the caller
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("text not found: {text:?}")]
    TextNotFound { text: String },

    #[error("line {line} is outside the document ({lines} lines)")]
    LineOutOfRange { line: usize, lines: usize },
}

/// Outbound delivery failure
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("display surface is closed")]
    Closed,

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by the preview facade
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("preview was disposed")]
    Disposed,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn syntax_error_keeps_line_in_error_info() {
        let info = ErrorInfo::from(&CompileError::syntax(7, "Unknown command 'FOO'"));
        assert_eq!(info.kind, ErrorKind::Compile);
        assert_eq!(info.line, Some(7));
        assert!(info.message.contains("line 7"));
    }

    #[test]
    fn include_errors_are_reported_as_include_load() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = CompileError::include_load("chapter2", io);
        assert!(error.source().is_some());

        let info = ErrorInfo::from(&error);
        assert_eq!(info.kind, ErrorKind::IncludeLoad);
        assert!(info.message.contains("chapter2"));
    }

    #[test]
    fn syntax_error_in_include_names_the_file() {
        let error = CompileError::syntax(3, "bad").in_file("intro");
        assert_eq!(error.to_string(), "intro: line 3: bad");
        // Line numbers of included files do not point into the edited document
        assert_eq!(ErrorInfo::from(&error).line, None);
    }
}
