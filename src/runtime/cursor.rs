//! Execution position and variables of one running story

use crate::types::ast::{Choice, Comparison, Operation};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// A story variable
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Read a script literal, preferring the narrowest type
    pub fn parse(literal: &str) -> Self {
        if let Ok(n) = literal.parse::<i64>() {
            Value::Int(n)
        } else if let Ok(f) = literal.parse::<f64>() {
            Value::Float(f)
        } else if let Ok(b) = literal.parse::<bool>() {
            Value::Bool(b)
        } else {
            Value::Text(literal.to_string())
        }
    }

    fn from_number(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Value::Int(n as i64)
        } else {
            Value::Float(n)
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Why a SET/MODIFY/JUMP_IF could not be evaluated
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VariableError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{0}' and '{1}' can only be compared for equality")]
    NotOrdered(String, String),
}

/// Where a story instance currently is
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cursor {
    /// Index of the next node to execute
    pub pc: usize,
    pub vars: HashMap<String, Value>,
    /// Choices of the branch we stopped at, empty when not waiting
    pub pending_choices: Vec<Choice>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waiting_for_choice(&self) -> bool {
        !self.pending_choices.is_empty()
    }

    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, literal: &str) {
        self.vars.insert(name.into(), Value::parse(literal));
    }

    /// Apply `op` to a numeric variable; a missing variable counts as 0
    pub fn modify_var(
        &mut self,
        name: &str,
        op: Operation,
        operand: &str,
    ) -> Result<(), VariableError> {
        let current = match self.vars.get(name) {
            None => 0.0,
            Some(value) => value
                .as_number()
                .ok_or_else(|| VariableError::NotANumber(value.to_string()))?,
        };
        let operand = Value::parse(operand)
            .as_number()
            .ok_or_else(|| VariableError::NotANumber(operand.to_string()))?;

        let result = match op {
            Operation::Add => current + operand,
            Operation::Subtract => current - operand,
            Operation::Multiply => current * operand,
            Operation::Divide if operand == 0.0 => return Err(VariableError::DivisionByZero),
            Operation::Divide => current / operand,
        };
        self.vars.insert(name.to_string(), Value::from_number(result));
        Ok(())
    }

    /// Evaluate `var cmp literal`
    ///
    /// Numbers compare numerically; anything else only supports equality on
    /// its text form. A missing variable counts as 0.
    pub fn check_condition(
        &self,
        var: &str,
        cmp: Comparison,
        literal: &str,
    ) -> Result<bool, VariableError> {
        let current = self.vars.get(var).cloned().unwrap_or(Value::Int(0));
        let expected = Value::parse(literal);

        if let (Some(a), Some(b)) = (current.as_number(), expected.as_number()) {
            return Ok(match cmp {
                Comparison::Equal => (a - b).abs() < f64::EPSILON,
                Comparison::NotEqual => (a - b).abs() >= f64::EPSILON,
                Comparison::LessThan => a < b,
                Comparison::LessThanOrEqual => a <= b,
                Comparison::GreaterThan => a > b,
                Comparison::GreaterThanOrEqual => a >= b,
            });
        }

        let (a, b) = (current.to_string(), expected.to_string());
        match cmp {
            Comparison::Equal => Ok(a == b),
            Comparison::NotEqual => Ok(a != b),
            _ => Err(VariableError::NotOrdered(a, b)),
        }
    }
}
