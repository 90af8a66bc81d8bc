//! Configuration module for Sluice.
//!
//! Handles the analyzer, rendering, cache and logging settings.

mod settings;

pub use settings::{
    expand_env_vars, AnalyzerSettings, CacheSettings, LogFormat, LoggingSettings, RenderSettings,
    Settings, SettingsError, ANALYZER_ENV, CONFIG_ENV,
};
