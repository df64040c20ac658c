//! Editor configuration: a single knob, `scroll_lines`, handed to the input
//! interpreter alongside each terminal event (spec §6).
//!
//! Loaded from an optional TOML file; every field defaults when absent or
//! when no file is given, so a missing config is never a fatal error.

use std::path::Path;

use serde::Deserialize;

/// Number of lines a scroll-line mutator moves the viewport by default.
pub const DEFAULT_SCROLL_LINES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scroll_lines: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { scroll_lines: DEFAULT_SCROLL_LINES }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults if the file is absent or
    /// fails to parse. Parse errors are logged, not propagated: a bad config
    /// file should never keep the editor from starting (spec §7: config
    /// loading is out of the core's scope, but a best-effort default here
    /// keeps `editor-bin`'s bootstrap simple).
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(target: "config", path = %path.display(), %err, "no config file, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(target: "config", path = %path.display(), %err, "invalid config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/oxidized.toml"));
        assert_eq!(config.scroll_lines, DEFAULT_SCROLL_LINES);
    }

    #[test]
    fn parses_scroll_lines_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oxidized.toml");
        std::fs::write(&path, "scroll_lines = 7\n").unwrap();
        let config = Config::load(&path);
        assert_eq!(config.scroll_lines, 7);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oxidized.toml");
        std::fs::write(&path, "not valid toml :::").unwrap();
        let config = Config::load(&path);
        assert_eq!(config, Config::default());
    }
}
