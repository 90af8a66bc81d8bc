//! Logging setup for the CLI.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job. Output always goes to stderr so stdout stays machine-readable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};

/// Environment variable holding an `EnvFilter` directive, e.g. `sluice=debug`.
pub const LOG_ENV: &str = "SLUICE_LOG";

#[derive(Debug, thiserror::Error)]
#[error("failed to initialise logging: {0}")]
pub struct LoggingError(String);

/// Install the global subscriber. `SLUICE_LOG` wins over the configured level.
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    let filter = filter(settings);
    let subscriber = tracing_subscriber::registry().with(filter);

    match settings.format {
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| LoggingError(e.to_string()))
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&settings.level))
}
