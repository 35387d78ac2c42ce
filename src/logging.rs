//! Stderr backend for the `log` facade
//!
//! Records are filtered by level and by category, where the category is
//! derived from the record's module path.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Environment variable that turns logging on
pub const DEBUG_ENV: &str = "UTSUSHI_DEBUG";

/// Minimum level of records written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Part of the crate a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogCategory {
    /// Script execution
    Runtime,
    /// Action log, replay and rewind
    Session,
    /// Display-surface messages
    Bridge,
    /// Parsing, includes and recompiles
    Compiler,
    /// Command-line front end
    Cli,
}

impl LogCategory {
    /// Category for a log target, `None` for targets outside this crate
    pub fn of_target(target: &str) -> Option<Self> {
        let path = target.strip_prefix("utsushi")?;
        if !path.is_empty() && !path.starts_with("::") {
            return None;
        }
        let module = path.trim_start_matches("::").split("::").next()?;
        Some(match module {
            "runtime" => LogCategory::Runtime,
            "session" | "preview" => LogCategory::Session,
            "bridge" | "navigation" => LogCategory::Bridge,
            "parser" | "compiler" | "recompile" => LogCategory::Compiler,
            _ => LogCategory::Cli,
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    pub level: LogLevel,
    pub categories: HashSet<LogCategory>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let categories = [
            LogCategory::Session,
            LogCategory::Bridge,
            LogCategory::Compiler,
            LogCategory::Cli,
        ]
        .into_iter()
        .collect();

        Self {
            enabled: std::env::var(DEBUG_ENV).is_ok(),
            level: LogLevel::Debug,
            categories,
        }
    }
}

impl LogConfig {
    /// Everything, at trace level
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Trace,
            categories: [
                LogCategory::Runtime,
                LogCategory::Session,
                LogCategory::Bridge,
                LogCategory::Compiler,
                LogCategory::Cli,
            ]
            .into_iter()
            .collect(),
        }
    }

    fn allows(&self, metadata: &log::Metadata) -> bool {
        if !self.enabled || metadata.level() > self.level.filter() {
            return false;
        }
        match LogCategory::of_target(metadata.target()) {
            Some(category) => self.categories.contains(&category),
            // Dependencies only get through at warn and above
            None => metadata.level() <= log::Level::Warn,
        }
    }
}

struct StderrLogger {
    config: LogConfig,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.config.allows(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let category = LogCategory::of_target(record.target())
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| record.target().to_string());
        eprintln!("[{}] {:10} {}", record.level(), category, record.args());
    }

    fn flush(&self) {}
}

/// Install the stderr logger; later calls are ignored
pub fn init(config: &LogConfig) {
    let max_level = if config.enabled {
        config.level.filter()
    } else {
        log::LevelFilter::Off
    };
    let logger = StderrLogger {
        config: config.clone(),
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }
}
