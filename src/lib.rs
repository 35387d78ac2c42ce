//! # utsushi
//!
//! Live preview sessions for Markdown narrative scripts.
//!
//! A session records every user intent in an action log and derives the
//! preview state by folding that log over a running story. When the script
//! is edited it is recompiled and the log replayed against the new story, so
//! the reader stays on the same path through the story while the author
//! writes.
//!
//! ## Quick Start
//!
//! ```rust
//! use utsushi::compiler::link;
//! use utsushi::parser::parse;
//! use utsushi::runtime::ScriptRuntime;
//! use utsushi::session::Session;
//! use utsushi::types::Action;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let script = r#"
//! [SAY speaker=Ayumi]
//! Which way?
//! [BRANCH choice=left choice=right]
//! [LABEL name=left]
//! You went left.
//! [LABEL name=right]
//! "#;
//!
//! let story = ScriptRuntime::new(link(parse(script)?)?);
//! let mut session = Session::new(true);
//! session.begin(Box::new(story))?;
//! session.dispatch(Action::SelectChoice { index: 0 })?;
//!
//! assert_eq!(
//!     session.state().transcript_text(),
//!     vec!["Which way?", "You went left."]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Live Preview
//!
//! [`Preview`] runs a session behind a display surface: it waits for the
//! surface's `ready`, compiles edits in the background and pushes every new
//! state as an `updateState` message.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use utsushi::bridge::ChannelSurface;
//! use utsushi::compiler::{MemoryIncludeResolver, ScriptCompiler};
//! use utsushi::Preview;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let compiler = Arc::new(ScriptCompiler::new(Arc::new(MemoryIncludeResolver::new())));
//! let (surface, mut updates) = ChannelSurface::new();
//! let preview = Preview::spawn(compiler, Arc::new(surface), true);
//!
//! preview.initialize_story("Hello!\n");
//! preview.handle_message(r#"{"type":"ready"}"#).await?;
//! println!("{:?}", updates.recv().await);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod parser;
pub mod preview;
mod recompile;
pub mod runtime;
pub mod session;
pub mod types;

pub use bridge::{DisplaySurface, InboundMessage, OutboundMessage};
pub use compiler::{Compiler, IncludeResolver, ScriptCompiler};
pub use config::PreviewConfig;
pub use error::{
    CompileError, CompileErrors, NavigationError, PreviewError, ProtocolError, RuntimeError,
    SessionError, SurfaceError,
};
pub use navigation::{JumpTarget, Position};
pub use preview::Preview;
pub use runtime::{RuntimeAdapter, ScriptRuntime};
pub use session::{ActionLog, Session};
pub use types::{Action, ErrorInfo, ErrorKind, State};
