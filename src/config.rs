//! Preview configuration

use crate::logging::{DEBUG_ENV, LogConfig};
use crate::runtime::DEFAULT_MAX_STEPS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one preview session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Directory `[INCLUDE]` names are resolved against; defaults to the
    /// script's own directory
    pub include_root: Option<PathBuf>,
    /// Initial live-update flag of a new session
    pub live_update: bool,
    /// Node budget for one continue before the story is considered stuck
    pub max_steps: usize,
    /// How often the CLI checks the script file for changes
    pub poll_interval_ms: u64,
    pub log: LogConfig,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            include_root: None,
            live_update: true,
            max_steps: DEFAULT_MAX_STEPS,
            poll_interval_ms: 250,
            log: LogConfig::default(),
        }
    }
}

impl PreviewConfig {
    /// Parse a JSON config; missing fields keep their defaults
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            let mut config = Self::default();
            config.apply_env();
            return Ok(config);
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_json(&json)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    /// Include root to use for a script at `script_path`
    pub fn include_root_for(&self, script_path: &Path) -> PathBuf {
        self.include_root.clone().unwrap_or_else(|| {
            script_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    fn apply_env(&mut self) {
        if std::env::var(DEBUG_ENV).is_ok() {
            self.log.enabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PreviewConfig::from_json(r#"{"max_steps": 500, "log": {"level": "info"}}"#)
            .unwrap();

        assert_eq!(config.max_steps, 500);
        assert!(config.live_update);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn include_root_defaults_to_script_directory() {
        let config = PreviewConfig::default();
        assert_eq!(
            config.include_root_for(Path::new("stories/intro.md")),
            PathBuf::from("stories")
        );

        let config = PreviewConfig {
            include_root: Some(PathBuf::from("/shared")),
            ..PreviewConfig::default()
        };
        assert_eq!(
            config.include_root_for(Path::new("stories/intro.md")),
            PathBuf::from("/shared")
        );
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utsushi.json");
        std::fs::write(&path, r#"{"live_update": false}"#).unwrap();

        let config = PreviewConfig::load(Some(&path)).unwrap();
        assert!(!config.live_update);

        assert!(PreviewConfig::load(Some(&dir.path().join("missing.json"))).is_err());
    }
}
