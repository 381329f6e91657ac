//! Persisted cross-session settings.
//!
//! The settings file is a single pretty-printed JSON object holding the
//! analyzer and URL-iterator configuration plus the iterator cursor. It is
//! read once at startup and written back at shutdown; the cursor is the only
//! value that changes outside explicit user edits.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config;

/// Result type for settings operations
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors that can occur loading or saving the settings file
#[derive(Debug)]
pub enum SettingsError {
    /// I/O error reading or writing the file
    Io(std::io::Error),
    /// The file exists but is not valid settings JSON
    Malformed(serde_json::Error),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "I/O error: {}", err),
            SettingsError::Malformed(err) => write!(f, "Malformed settings file: {}", err),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Malformed(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Malformed(err)
    }
}

/// Persisted configuration for the analyzer pipeline and URL iterator.
///
/// Key names in the file are camelCase (`analyzerEnabled`, `dumpPath`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Whether the external analyzer runs on page-load-finished
    pub analyzer_enabled: bool,

    /// Path to the analyzer executable
    pub analyzer_path: String,

    /// Path the VDOM dump is written to (result file is `<dump>.res`)
    pub dump_path: String,

    /// Whether the URL iterator feature is enabled
    pub iterator_enabled: bool,

    /// Path to the URL list file backing the iterator
    pub iterator_file: String,

    /// Persisted iterator cursor, restored on the next session
    pub iterator_cursor: i64,
}

impl Default for Settings {
    fn default() -> Self {
        let cfg = config::get();
        Self {
            analyzer_enabled: false,
            analyzer_path: cfg.paths.analyzer.clone(),
            dump_path: cfg.paths.dump.clone(),
            iterator_enabled: false,
            iterator_file: cfg.paths.url_file.clone(),
            iterator_cursor: 0,
        }
    }
}

impl Settings {
    /// Load settings from `path`.
    ///
    /// A missing file is a first run and yields defaults; an unreadable or
    /// malformed file is an error so a damaged configuration is never
    /// silently replaced.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Write settings to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> SettingsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");

        let settings = Settings {
            analyzer_enabled: true,
            analyzer_path: "/usr/local/bin/findtitles".to_string(),
            dump_path: "/tmp/page.vdom".to_string(),
            iterator_enabled: true,
            iterator_file: "/tmp/urls.txt".to_string(),
            iterator_cursor: 7,
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_file_keys_are_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        Settings::default().save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"analyzerEnabled\""));
        assert!(raw.contains("\"iteratorCursor\""));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Malformed(_)));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"analyzerEnabled": true}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert!(settings.analyzer_enabled);
        assert_eq!(settings.iterator_cursor, 0);
    }
}
