//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for VDOM Hunter, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults for local use
//! - A cached global for cheap repeated access
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `VDOM_HUNTER_SETTINGS` | Persisted settings file path | `/tmp/vdom-hunter/settings.json` |
//! | `VDOM_HUNTER_ANALYZER` | Default analyzer executable path | (empty) |
//! | `VDOM_HUNTER_DUMP` | Default VDOM dump file path | `/tmp/vdom-hunter/page.vdom` |
//! | `VDOM_HUNTER_URL_FILE` | Default URL list file path | (empty) |
//! | `VDOM_HUNTER_WAIT_TIMEOUT` | Analyzer wait timeout in seconds | `60` |
//!
//! # Example
//!
//! ```bash
//! # Point the pipeline at a locally built analyzer
//! export VDOM_HUNTER_ANALYZER="$HOME/bin/findtitles"
//! export VDOM_HUNTER_DUMP="/tmp/page.vdom"
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default persisted settings file path
pub const DEFAULT_SETTINGS_PATH: &str = "/tmp/vdom-hunter/settings.json";

/// Default VDOM dump file path
pub const DEFAULT_DUMP_PATH: &str = "/tmp/vdom-hunter/page.vdom";

/// Default analyzer wait timeout (seconds)
pub const DEFAULT_WAIT_TIMEOUT: u64 = 60;

/// Maximum length of a single line read from a URL list file; longer lines
/// are truncated at this cap before trimming.
pub const MAX_URL_LINE_LEN: usize = 1024;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the settings file path
pub const ENV_SETTINGS_PATH: &str = "VDOM_HUNTER_SETTINGS";

/// Environment variable for the default analyzer executable
pub const ENV_ANALYZER_PATH: &str = "VDOM_HUNTER_ANALYZER";

/// Environment variable for the default dump path
pub const ENV_DUMP_PATH: &str = "VDOM_HUNTER_DUMP";

/// Environment variable for the default URL list file
pub const ENV_URL_FILE: &str = "VDOM_HUNTER_URL_FILE";

/// Environment variable for the analyzer wait timeout
pub const ENV_WAIT_TIMEOUT: &str = "VDOM_HUNTER_WAIT_TIMEOUT";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for VDOM Hunter
#[derive(Debug, Clone)]
pub struct Config {
    /// Path settings
    pub paths: PathSettings,
    /// Analyzer process settings
    pub analyzer: AnalyzerSettings,
}

/// File-path related settings
#[derive(Debug, Clone)]
pub struct PathSettings {
    /// Persisted settings file
    pub settings_file: String,
    /// Default analyzer executable
    pub analyzer: String,
    /// Default VDOM dump file
    pub dump: String,
    /// Default URL list file
    pub url_file: String,
}

/// Analyzer process related settings
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Maximum time to wait for the analyzer to exit (seconds)
    pub wait_timeout: u64,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            paths: PathSettings::from_env(),
            analyzer: AnalyzerSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            paths: PathSettings::defaults(),
            analyzer: AnalyzerSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PathSettings {
    /// Create path settings from environment variables
    pub fn from_env() -> Self {
        Self {
            settings_file: env::var(ENV_SETTINGS_PATH)
                .unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string()),
            analyzer: env::var(ENV_ANALYZER_PATH).unwrap_or_default(),
            dump: env::var(ENV_DUMP_PATH).unwrap_or_else(|_| DEFAULT_DUMP_PATH.to_string()),
            url_file: env::var(ENV_URL_FILE).unwrap_or_default(),
        }
    }

    /// Create path settings with defaults
    pub fn defaults() -> Self {
        Self {
            settings_file: DEFAULT_SETTINGS_PATH.to_string(),
            analyzer: String::new(),
            dump: DEFAULT_DUMP_PATH.to_string(),
            url_file: String::new(),
        }
    }
}

impl AnalyzerSettings {
    /// Create analyzer settings from environment variables
    pub fn from_env() -> Self {
        Self {
            wait_timeout: env::var(ENV_WAIT_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_WAIT_TIMEOUT),
        }
    }

    /// Create analyzer settings with defaults
    pub fn defaults() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Get the settings file path (convenience function)
pub fn settings_file() -> String {
    get().paths.settings_file.clone()
}

/// Get the default dump path (convenience function)
pub fn default_dump_path() -> String {
    get().paths.dump.clone()
}

/// Get the analyzer wait timeout (convenience function)
pub fn wait_timeout() -> u64 {
    get().analyzer.wait_timeout
}
