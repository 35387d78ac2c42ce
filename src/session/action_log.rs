//! Append-only record of dispatched actions

use crate::types::Action;

/// Ordered actions of one session
///
/// Grows by `push`; shrinks only when a choice is rewound, a recompile
/// supersedes earlier compile errors, or the session is reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    actions: Vec<Action>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Position of the last choice-affecting action before `end`
    pub fn last_choice_before(&self, end: usize) -> Option<usize> {
        let end = end.min(self.actions.len());
        self.actions[..end].iter().rposition(Action::affects_choice)
    }

    /// Drop the action at `position` and everything after it
    pub fn truncate(&mut self, position: usize) {
        self.actions.truncate(position);
    }

    /// Drop choice-affecting actions from `position` on, keeping the rest
    pub fn drop_choices_from(&mut self, position: usize) {
        let mut index = 0;
        self.actions.retain(|action| {
            let keep = index < position || !action.affects_choice();
            index += 1;
            keep
        });
    }

    /// Remove compile errors recorded by earlier failed compiles
    ///
    /// Other recorded errors stay; a `RecordErrors` left empty is dropped.
    pub fn drop_compile_errors(&mut self) {
        self.actions.retain_mut(|action| match action {
            Action::RecordErrors { errors } => {
                errors.retain(|error| !error.kind.is_compile());
                !errors.is_empty()
            }
            _ => true,
        });
    }
}

impl From<Vec<Action>> for ActionLog {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

impl<'a> IntoIterator for &'a ActionLog {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
