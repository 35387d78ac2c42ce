//! Compiled script representation

use std::collections::HashMap;

/// A linked script, ready to run
///
/// Includes are already spliced in and every label maps to the index of its
/// `Label` node.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub nodes: Vec<AstNode>,
    pub labels: HashMap<String, usize>,
}

impl Ast {
    pub fn new(nodes: Vec<AstNode>, labels: HashMap<String, usize>) -> Self {
        Self { nodes, labels }
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn node(&self, index: usize) -> Option<&AstNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One script command
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Dialogue, or narration when `speaker` is None
    Say {
        speaker: Option<String>,
        text: String,
    },
    ShowImage { layer: String, name: String },
    PlayBgm { name: String },
    PlaySe { name: String },
    PlayMovie { name: String },
    Wait { seconds: f32 },
    /// Stop and offer choices
    Branch { choices: Vec<Choice> },
    Jump { label: String },
    JumpIf {
        var: String,
        cmp: Comparison,
        value: String,
        label: String,
    },
    Set { name: String, value: String },
    Modify {
        name: String,
        op: Operation,
        value: String,
    },
    /// Jump target; does nothing when executed
    Label { name: String },
    ClearLayer { layer: String },
    /// Call into a host-provided function
    Call { name: String, args: Vec<String> },
    /// Splice another script here; gone after linking
    Include { name: String },
}

/// A branch option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Text shown to the reader
    pub text: String,
    /// Label jumped to when taken
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}
