//! Command-line front ends

pub mod play;
pub mod serve;
pub mod view_state;
pub mod watcher;

use crate::compiler::{Compiler, FileIncludeResolver, ScriptCompiler};
use crate::config::PreviewConfig;
use std::path::Path;
use std::sync::Arc;

/// Compiler for `script`, resolving includes per `config`
pub fn compiler_for(script: &Path, config: &PreviewConfig) -> Arc<dyn Compiler> {
    let resolver = FileIncludeResolver::new(config.include_root_for(script));
    Arc::new(ScriptCompiler::new(Arc::new(resolver)).with_max_steps(config.max_steps))
}
