//! Markdown parser for preview scripts
//!
//! Converts the bracketed command dialect into unlinked AST nodes. Includes
//! stay as `AstNode::Include` until the compiler splices them in.

use crate::error::{CompileError, CompileErrors};
use crate::types::ast::{AstNode, Choice, Comparison, Operation};
use std::collections::HashMap;


type Params = HashMap<String, Vec<String>>;

/// Parse markdown content into AST nodes, reporting every syntax error found
pub fn parse(markdown: &str) -> Result<Vec<AstNode>, CompileErrors> {
    let parser = MarkdownParser::new(markdown);
    parser.parse()
}

struct MarkdownParser {
    lines: Vec<String>,
    current_line: usize,
    nodes: Vec<AstNode>,
    errors: Vec<CompileError>,
}

impl MarkdownParser {
    fn new(markdown: &str) -> Self {
        let lines: Vec<String> = markdown.lines().map(|s| s.to_string()).collect();
        Self {
            lines,
            current_line: 0,
            nodes: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Vec<AstNode>, CompileErrors> {
        while self.current_line < self.lines.len() {
            if let Err(error) = self.parse_line() {
                self.errors.push(error);
            }
            self.current_line += 1;
        }

        if self.errors.is_empty() {
            Ok(self.nodes)
        } else {
            Err(CompileErrors(self.errors))
        }
    }

    fn line_number(&self) -> usize {
        self.current_line + 1
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::syntax(self.line_number(), message)
    }

    fn parse_line(&mut self) -> Result<(), CompileError> {
        let trimmed = self.lines[self.current_line].trim().to_string();

        if is_skippable(&trimmed) {
            return Ok(());
        }

        match extract_command(&trimmed) {
            Some((cmd_content, rest)) => {
                let node = self.parse_command(&cmd_content, rest.trim())?;
                self.nodes.push(node);
            }
            None if trimmed.starts_with('[') => {
                return Err(self.error("Unterminated command, missing ']'"));
            }
            // Free-standing text is narration
            None => self.nodes.push(AstNode::Say {
                speaker: None,
                text: trimmed,
            }),
        }

        Ok(())
    }

    fn parse_command(&mut self, cmd_str: &str, trailing: &str) -> Result<AstNode, CompileError> {
        let tokens = tokenize(cmd_str);
        let Some((command_name, args)) = tokens.split_first() else {
            return Err(self.error("Empty command"));
        };
        let (positional, params) = split_params(args);

        match command_name.as_str() {
            "SAY" => {
                let speaker = first(&params, "speaker");
                let text = if trailing.is_empty() {
                    self.take_say_text()?
                } else {
                    trailing.to_string()
                };
                Ok(AstNode::Say { speaker, text })
            }
            "PLAY_BGM" => Ok(AstNode::PlayBgm {
                name: self.require_param(&params, "name", command_name)?,
            }),
            "PLAY_SE" => Ok(AstNode::PlaySe {
                name: self.require_param(&params, "name", command_name)?,
            }),
            "SHOW_IMAGE" => {
                let name = self.require_param(&params, "name", command_name)?;
                let layer = first(&params, "layer").unwrap_or_else(|| "default".to_string());
                Ok(AstNode::ShowImage { layer, name })
            }
            "PLAY_MOVIE" => Ok(AstNode::PlayMovie {
                name: self.require_param(&params, "name", command_name)?,
            }),
            "WAIT" => {
                let seconds = self.parse_wait_duration(&positional, &params)?;
                Ok(AstNode::Wait { seconds })
            }
            "BRANCH" => {
                let choices = self.parse_branch_choices(&params)?;
                Ok(AstNode::Branch { choices })
            }
            "LABEL" => Ok(AstNode::Label {
                name: self.require_param(&params, "name", command_name)?,
            }),
            "JUMP" => Ok(AstNode::Jump {
                label: self.require_param(&params, "label", command_name)?,
            }),
            "JUMP_IF" => {
                let var = self.require_param(&params, "var", command_name)?;
                let cmp =
                    self.parse_comparison(&self.require_param(&params, "cmp", command_name)?)?;
                let value = self.require_param(&params, "value", command_name)?;
                let label = self.require_param(&params, "label", command_name)?;
                Ok(AstNode::JumpIf {
                    var,
                    cmp,
                    value,
                    label,
                })
            }
            "SET" => {
                let name = self.require_param(&params, "name", command_name)?;
                let value = self.require_param(&params, "value", command_name)?;
                Ok(AstNode::Set { name, value })
            }
            "MODIFY" => {
                let name = self.require_param(&params, "name", command_name)?;
                let op =
                    self.parse_operation(&self.require_param(&params, "op", command_name)?)?;
                let value = self.require_param(&params, "value", command_name)?;
                Ok(AstNode::Modify { name, op, value })
            }
            "CLEAR_LAYER" => Ok(AstNode::ClearLayer {
                layer: self.require_param(&params, "layer", command_name)?,
            }),
            "CALL" => {
                let name = self.require_param(&params, "name", command_name)?;
                let args = params.get("arg").cloned().unwrap_or_default();
                Ok(AstNode::Call { name, args })
            }
            "INCLUDE" => Ok(AstNode::Include {
                name: self.require_param(&params, "name", command_name)?,
            }),
            _ => Err(self.error(format!("Unknown command '{}'", command_name))),
        }
    }

    fn require_param(&self, params: &Params, key: &str, command: &str) -> Result<String, CompileError> {
        first(params, key).ok_or_else(|| {
            self.error(format!(
                "Missing required parameter '{}' for command '{}'",
                key, command
            ))
        })
    }

    /// Consume the next text line as the body of a SAY
    fn take_say_text(&mut self) -> Result<String, CompileError> {
        let mut text_line = self.current_line + 1;
        while text_line < self.lines.len() {
            let line = self.lines[text_line].trim();
            if is_skippable(line) {
                text_line += 1;
                continue;
            }
            if line.starts_with('[') {
                break;
            }
            let text = line.to_string();
            self.current_line = text_line;
            return Ok(text);
        }
        Err(self.error("SAY command missing text"))
    }

    fn parse_wait_duration(&self, positional: &[String], params: &Params) -> Result<f32, CompileError> {
        // Inline form: [WAIT 1.5s]
        if let Some(duration_str) = positional.first()
            && let Some(num_str) = duration_str.strip_suffix('s')
        {
            return num_str
                .parse::<f32>()
                .map_err(|_| self.error(format!("Invalid duration '{}'", duration_str)));
        }

        if let Some(seconds) = first(params, "seconds").or_else(|| first(params, "duration")) {
            return seconds
                .parse::<f32>()
                .map_err(|_| self.error(format!("Invalid duration '{}'", seconds)));
        }

        Err(self.error("WAIT command missing duration"))
    }

    /// Pair `choice=` and `label=` values by position
    fn parse_branch_choices(&self, params: &Params) -> Result<Vec<Choice>, CompileError> {
        let labels = params.get("label").cloned().unwrap_or_default();
        let choices: Vec<Choice> = params
            .get("choice")
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .map(|(i, text)| Choice {
                        text: text.clone(),
                        target: labels.get(i).cloned().unwrap_or_else(|| text.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if choices.is_empty() {
            return Err(self.error("BRANCH command missing choices"));
        }
        if labels.len() > choices.len() {
            return Err(self.error(format!(
                "BRANCH has {} labels but only {} choices",
                labels.len(),
                choices.len()
            )));
        }

        Ok(choices)
    }

    fn parse_comparison(&self, cmp_str: &str) -> Result<Comparison, CompileError> {
        match cmp_str {
            "eq" | "==" => Ok(Comparison::Equal),
            "ne" | "!=" => Ok(Comparison::NotEqual),
            "lt" | "<" => Ok(Comparison::LessThan),
            "le" | "<=" => Ok(Comparison::LessThanOrEqual),
            "gt" | ">" => Ok(Comparison::GreaterThan),
            "ge" | ">=" => Ok(Comparison::GreaterThanOrEqual),
            _ => Err(self.error(format!("Invalid comparison operator '{}'", cmp_str))),
        }
    }

    fn parse_operation(&self, op_str: &str) -> Result<Operation, CompileError> {
        match op_str {
            "add" | "+" => Ok(Operation::Add),
            "sub" | "-" => Ok(Operation::Subtract),
            "mul" | "*" => Ok(Operation::Multiply),
            "div" | "/" => Ok(Operation::Divide),
            _ => Err(self.error(format!("Invalid operation '{}'", op_str))),
        }
    }
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with("<!--") || line.starts_with('#')
}

/// Split `[CMD ...] trailing` into the bracket content and the trailing text
fn extract_command(line: &str) -> Option<(String, &str)> {
    let body = line.strip_prefix('[')?;
    let mut in_quotes = false;
    for (i, c) in body.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ']' if !in_quotes => return Some((body[..i].to_string(), &body[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Whitespace-separated tokens; double quotes group spaces into one token
fn tokenize(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in content.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn split_params(tokens: &[String]) -> (Vec<String>, Params) {
    let mut positional = Vec::new();
    let mut params: Params = HashMap::new();

    for token in tokens {
        // `choice=A label=a, choice=B label=b` separates pairs with commas
        let token = token.trim_end_matches(',');
        match token.split_once('=') {
            Some((key, value)) => params
                .entry(key.trim().to_string())
                .or_default()
                .push(unquote(value.trim())),
            None if !token.is_empty() => positional.push(unquote(token)),
            None => {}
        }
    }

    (positional, params)
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

fn first(params: &Params, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.first()).cloned()
}
