//! Compiler capability: source text in, runnable story out
//!
//! Compilation is parse → splice includes → link labels. Every stage reports
//! all the errors it finds. A failed include load fails the whole compile.

use crate::error::{CompileError, CompileErrors};
use crate::parser;
use crate::runtime::{DEFAULT_MAX_STEPS, RuntimeAdapter, ScriptRuntime};
use crate::types::ast::{Ast, AstNode};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads the text of `[INCLUDE name=...]` targets
#[async_trait]
pub trait IncludeResolver: Send + Sync {
    async fn load(&self, name: &str) -> std::io::Result<String>;
}

/// Produces runtime instances from source text
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, source: &str) -> Result<Box<dyn RuntimeAdapter>, CompileErrors>;
}

/// Resolves includes relative to a directory
#[derive(Debug, Clone)]
pub struct FileIncludeResolver {
    root: PathBuf,
}

impl FileIncludeResolver {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// `name` under the root, with `.md` added when it has no extension
    pub fn path_for(&self, name: &str) -> PathBuf {
        let path = self.root.join(name);
        if Path::new(name).extension().is_some() {
            path
        } else {
            path.with_extension("md")
        }
    }
}

#[async_trait]
impl IncludeResolver for FileIncludeResolver {
    async fn load(&self, name: &str) -> std::io::Result<String> {
        let path = self.path_for(name);
        log::debug!("Loading include '{}' from {}", name, path.display());
        tokio::fs::read_to_string(&path).await
    }
}

/// Includes served from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryIncludeResolver {
    files: HashMap<String, String>,
}

impl MemoryIncludeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.files.insert(name.into(), text.into());
        self
    }
}

#[async_trait]
impl IncludeResolver for MemoryIncludeResolver {
    async fn load(&self, name: &str) -> std::io::Result<String> {
        self.files.get(name).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no include named '{}'", name),
            )
        })
    }
}

/// Compile `source` into a linked AST
pub async fn compile_ast(source: &str, resolver: &dyn IncludeResolver) -> Result<Ast, CompileErrors> {
    let nodes = parser::parse(source)?;
    let nodes = resolve_includes(nodes, resolver).await?;
    link(nodes)
}

/// Splice included scripts in place of their `Include` nodes
async fn resolve_includes(
    nodes: Vec<AstNode>,
    resolver: &dyn IncludeResolver,
) -> Result<Vec<AstNode>, CompileErrors> {
    let mut resolved = Vec::with_capacity(nodes.len());
    let mut errors = Vec::new();
    // Each frame is an open file: its include name and the nodes left to visit
    let mut frames: Vec<(Option<String>, std::vec::IntoIter<AstNode>)> =
        vec![(None, nodes.into_iter())];

    while let Some((_, remaining)) = frames.last_mut() {
        let Some(node) = remaining.next() else {
            frames.pop();
            continue;
        };

        let AstNode::Include { name } = node else {
            resolved.push(node);
            continue;
        };

        if frames
            .iter()
            .any(|(open, _)| open.as_deref() == Some(name.as_str()))
        {
            errors.push(CompileError::IncludeCycle { name });
            continue;
        }

        match resolver.load(&name).await {
            Ok(text) => match parser::parse(&text) {
                Ok(included) => frames.push((Some(name), included.into_iter())),
                Err(CompileErrors(parse_errors)) => {
                    errors.extend(parse_errors.into_iter().map(|e| e.in_file(&name)));
                }
            },
            Err(source) => errors.push(CompileError::include_load(name, source)),
        }
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(CompileErrors(errors))
    }
}

/// Build the label table and check every jump target exists
pub fn link(nodes: Vec<AstNode>) -> Result<Ast, CompileErrors> {
    let mut errors = Vec::new();
    let mut labels = HashMap::new();

    for (index, node) in nodes.iter().enumerate() {
        if let AstNode::Label { name } = node
            && labels.insert(name.clone(), index).is_some()
        {
            errors.push(CompileError::DuplicateLabel {
                label: name.clone(),
            });
        }
    }

    let mut referenced = BTreeSet::new();
    for node in &nodes {
        match node {
            AstNode::Jump { label } | AstNode::JumpIf { label, .. } => {
                referenced.insert(label.as_str());
            }
            AstNode::Branch { choices } => {
                referenced.extend(choices.iter().map(|c| c.target.as_str()));
            }
            _ => {}
        }
    }
    for label in referenced {
        if !labels.contains_key(label) {
            errors.push(CompileError::UndefinedLabel {
                label: label.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(Ast::new(nodes, labels))
    } else {
        Err(CompileErrors(errors))
    }
}

/// The bundled compiler for markdown scripts
pub struct ScriptCompiler {
    resolver: Arc<dyn IncludeResolver>,
    max_steps: usize,
}

impl ScriptCompiler {
    pub fn new(resolver: Arc<dyn IncludeResolver>) -> Self {
        Self {
            resolver,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }
}

#[async_trait]
impl Compiler for ScriptCompiler {
    async fn compile(&self, source: &str) -> Result<Box<dyn RuntimeAdapter>, CompileErrors> {
        let ast = compile_ast(source, self.resolver.as_ref()).await?;
        log::info!(
            "Compiled script: {} nodes, {} labels",
            ast.len(),
            ast.labels.len()
        );
        Ok(Box::new(ScriptRuntime::with_max_steps(ast, self.max_steps)))
    }
}
