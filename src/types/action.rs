//! Actions recorded in a session's log

use super::diagnostic::ErrorInfo;
use super::passage::FunctionEvent;
use serde::{Deserialize, Serialize};

/// A discrete user or system intent that advances or annotates a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    /// Begin (or restart) the story from its first line
    Start,
    /// Pick one of the currently offered choices
    SelectChoice { index: usize },
    /// Undo the last choice
    Rewind,
    ToggleLiveUpdate { enabled: bool },
    RecordErrors { errors: Vec<ErrorInfo> },
    RecordEvents { events: Vec<FunctionEvent> },
}

impl Action {
    /// Wire names of every variant, in declaration order
    pub const KINDS: [&'static str; 6] = [
        "start",
        "selectChoice",
        "rewind",
        "toggleLiveUpdate",
        "recordErrors",
        "recordEvents",
    ];

    /// Whether applying this action moves the story position
    pub fn affects_choice(&self) -> bool {
        matches!(self, Action::SelectChoice { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Start => Self::KINDS[0],
            Action::SelectChoice { .. } => Self::KINDS[1],
            Action::Rewind => Self::KINDS[2],
            Action::ToggleLiveUpdate { .. } => Self::KINDS[3],
            Action::RecordErrors { .. } => Self::KINDS[4],
            Action::RecordEvents { .. } => Self::KINDS[5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_kind_tagged_camel_case() {
        let json = serde_json::to_value(Action::SelectChoice { index: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "selectChoice", "index": 2}));

        let action: Action =
            serde_json::from_str(r#"{"kind":"toggleLiveUpdate","enabled":false}"#).unwrap();
        assert_eq!(action, Action::ToggleLiveUpdate { enabled: false });
    }

    #[test]
    fn kind_matches_serde_tag() {
        let actions = [
            Action::Start,
            Action::SelectChoice { index: 0 },
            Action::Rewind,
            Action::ToggleLiveUpdate { enabled: true },
            Action::RecordErrors { errors: vec![] },
            Action::RecordEvents { events: vec![] },
        ];
        for action in actions {
            let json = serde_json::to_value(&action).unwrap();
            assert_eq!(json["kind"], action.kind());
        }
    }
}
