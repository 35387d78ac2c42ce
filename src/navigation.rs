//! Resolves jump requests against the edited document

use crate::error::NavigationError;
use serde::{Deserialize, Serialize};

/// Where the host editor should reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JumpTarget {
    /// 1-based line number
    Line { line: usize },
    /// First line containing this text
    Text { text: String },
}

/// 1-based line and column in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Resolve `target` to a position in `document`
pub fn jump_to(document: &str, target: &JumpTarget) -> Result<Position, NavigationError> {
    match target {
        JumpTarget::Line { line } => {
            let lines = document.lines().count();
            if *line == 0 || *line > lines {
                return Err(NavigationError::LineOutOfRange { line: *line, lines });
            }
            Ok(Position {
                line: *line,
                column: 1,
            })
        }
        JumpTarget::Text { text } => {
            let needle = text.trim();
            if needle.is_empty() {
                return Err(NavigationError::TextNotFound { text: text.clone() });
            }
            document
                .lines()
                .enumerate()
                .find_map(|(index, line)| {
                    line.find(needle).map(|offset| Position {
                        line: index + 1,
                        column: line[..offset].chars().count() + 1,
                    })
                })
                .ok_or_else(|| {
                    log::debug!("Jump target {:?} not in document", needle);
                    NavigationError::TextNotFound { text: text.clone() }
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = "[SAY speaker=Ayumi]\nおはよう、世界。\n\n[BRANCH choice=\"go left\"]\n";

    #[test]
    fn line_targets_are_validated() {
        assert_eq!(
            jump_to(DOCUMENT, &JumpTarget::Line { line: 2 }),
            Ok(Position { line: 2, column: 1 })
        );
        assert_eq!(
            jump_to(DOCUMENT, &JumpTarget::Line { line: 0 }),
            Err(NavigationError::LineOutOfRange { line: 0, lines: 4 })
        );
        assert_eq!(
            jump_to(DOCUMENT, &JumpTarget::Line { line: 5 }),
            Err(NavigationError::LineOutOfRange { line: 5, lines: 4 })
        );
    }

    #[test]
    fn text_targets_find_the_first_match_in_characters() {
        let position = jump_to(
            DOCUMENT,
            &JumpTarget::Text {
                text: "  世界 ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(position, Position { line: 2, column: 6 });

        let position = jump_to(
            DOCUMENT,
            &JumpTarget::Text {
                text: "go left".to_string(),
            },
        )
        .unwrap();
        assert_eq!(position, Position { line: 4, column: 17 });
    }

    #[test]
    fn missing_or_blank_text_is_reported() {
        for text in ["nowhere", "   "] {
            let result = jump_to(
                DOCUMENT,
                &JumpTarget::Text {
                    text: text.to_string(),
                },
            );
            assert!(matches!(result, Err(NavigationError::TextNotFound { .. })));
        }
    }

    #[test]
    fn targets_decode_from_either_shape() {
        let line: JumpTarget = serde_json::from_str(r#"{"line": 3}"#).unwrap();
        let text: JumpTarget = serde_json::from_str(r#"{"text": "intro"}"#).unwrap();
        assert_eq!(line, JumpTarget::Line { line: 3 });
        assert_eq!(
            text,
            JumpTarget::Text {
                text: "intro".to_string()
            }
        );
    }
}
