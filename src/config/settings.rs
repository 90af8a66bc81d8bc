//! TOML-based configuration for Sluice.
//!
//! Supports a config file (sluice.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [analyzer]
//! path = "${SLUICE_ANALYZER}"
//! args = ["--workers", "4"]
//! timeout_secs = 30
//! max_query_length = 10000
//!
//! [render]
//! pipeline = "lineage-parser"
//! run_id = "lineage-parser"
//!
//! [render.variables]
//! region = "eu"
//!
//! [cache]
//! enabled = true
//! path = "$HOME/.cache/sluice/lineage.db"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lineage::DEFAULT_RENDER_CONTEXT;
use crate::render::QueryRenderer;
use crate::worker::{DEFAULT_MAX_QUERY_LENGTH, DEFAULT_TIMEOUT_SECS};

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "SLUICE_CONFIG";

/// Environment variable naming the analyzer executable when none is configured.
pub const ANALYZER_ENV: &str = "SLUICE_ANALYZER";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub analyzer: AnalyzerSettings,
    pub render: RenderSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

/// Analyzer worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Path to the analyzer executable (supports ${ENV_VAR} expansion).
    pub path: Option<String>,

    /// Extra command-line arguments for the analyzer.
    pub args: Vec<String>,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Statements longer than this are reported instead of analyzed.
    pub max_query_length: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        }
    }
}

impl AnalyzerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Template rendering context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    pub pipeline: String,
    pub run_id: String,

    /// Exposed to templates as `{{ var.<name> }}`.
    pub variables: BTreeMap<String, String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            pipeline: DEFAULT_RENDER_CONTEXT.to_string(),
            run_id: DEFAULT_RENDER_CONTEXT.to_string(),
            variables: BTreeMap::new(),
        }
    }
}

impl RenderSettings {
    /// Renderer for "yesterday" with the configured variables.
    pub fn renderer(&self) -> QueryRenderer {
        self.variables.iter().fold(
            QueryRenderer::with_yesterday(&self.pipeline, &self.run_id),
            |renderer, (name, value)| renderer.with_variable(name, value.clone()),
        )
    }
}

/// Analysis cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,

    /// Override for the cache database location.
    pub path: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `SLUICE_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SLUICE_CONFIG`
    /// 2. `./sluice.toml`
    /// 3. `~/.config/sluice/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sluice.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sluice").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Analyzer executable: the configured path, else `SLUICE_ANALYZER`.
    pub fn analyzer_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        if let Some(path) = &self.analyzer.path {
            return Ok(Some(PathBuf::from(expand_env_vars(path)?)));
        }
        Ok(env::var_os(ANALYZER_ENV).map(PathBuf::from))
    }

    /// Configured cache location with variables expanded, if any.
    pub fn cache_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.cache
            .path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
