// /////////////////////////////////////////////////////////////////////////////
// Variability Analysis Infrastructure
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Properties Configuration
//!
//! The core's only requirement of a config source is "return a string for a
//! key" (see `variability-core`'s documentation). This module supplies that
//! string by loading a Java-style `.properties` file: `key=value` lines,
//! `#` or `!` starting a comment, blank lines ignored.
//!
//! ## Format
//!
//! ```properties
//! # a comment
//! model.root=/srv/models/acme
//! ! also a comment
//! worker.count=4
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors loading a `.properties` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("malformed line {line} in {path}: {text:?}")]
    MalformedLine { path: String, line: usize, text: String },
}

/// Anything that can answer "what's the value for this key", the only
/// contract the core depends on.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<&str>;
}

/// An in-memory config loaded from a `.properties` file.
#[derive(Debug, Clone, Default)]
pub struct PropertiesConfig {
    entries: HashMap<String, String>,
}

impl PropertiesConfig {
    /// Loads and parses `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        Self::parse(&text, &path_ref.display().to_string())
    }

    /// Parses already-read `.properties` text, for callers that already
    /// hold the file content (and for tests).
    pub fn parse(text: &str, source_name: &str) -> Result<Self, ConfigError> {
        let mut entries = HashMap::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::MalformedLine {
                path: source_name.to_string(),
                line: index + 1,
                text: raw_line.to_string(),
            })?;

            entries.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { entries })
    }

    /// The number of key/value pairs loaded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigSource for PropertiesConfig {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        let config = PropertiesConfig::parse("model.root=/srv/models\nworker.count=4\n", "<test>").unwrap();
        assert_eq!(config.get("model.root"), Some("/srv/models"));
        assert_eq!(config.get("worker.count"), Some("4"));
        assert_eq!(config.len(), 2);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "# leading comment\n\n! bang comment\nkey=value\n   \n";
        let config = PropertiesConfig::parse(text, "<test>").unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.get("key"), Some("value"));
    }

    #[test]
    fn unknown_key_returns_none() {
        let config = PropertiesConfig::parse("a=1", "<test>").unwrap();
        assert_eq!(config.get("b"), None);
    }

    #[test]
    fn trims_whitespace_around_key_and_value() {
        let config = PropertiesConfig::parse("  spaced.key   =   spaced value  \n", "<test>").unwrap();
        assert_eq!(config.get("spaced.key"), Some("spaced value"));
    }

    #[test]
    fn rejects_a_line_without_an_equals_sign() {
        let result = PropertiesConfig::parse("not-a-valid-line\n", "<test>");
        assert!(matches!(result, Err(ConfigError::MalformedLine { line: 1, .. })));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = PropertiesConfig::load("/does/not/exist.properties");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn loads_from_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.properties");
        std::fs::write(&path, "greeting=hello\n").unwrap();

        let config = PropertiesConfig::load(&path).unwrap();
        assert_eq!(config.get("greeting"), Some("hello"));
    }
}
