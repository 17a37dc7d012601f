//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Filter used when neither settings nor environment name a level.
pub const DEFAULT_LOG_FILTER: &str = "lenscape=info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable, multi-line.
    #[default]
    Pretty,
}

impl LogFormat {
    /// Parses a format name; anything other than `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Line format.
    pub format: LogFormat,
    /// Level filter.
    pub filter: EnvFilter,
    /// Optional file to append to instead of stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds logging configuration from environment variables.
    #[must_use]
    pub fn from_env(verbose: bool) -> Self {
        Self::from_settings(None, verbose)
    }

    /// Builds logging configuration from config settings with env overrides.
    ///
    /// `RUST_LOG` wins over everything; `verbose` forces debug otherwise.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    fn resolve<F>(settings: Option<&LoggingSettings>, verbose: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let format = env("LENSCAPE_LOG_FORMAT")
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map_or_else(LogFormat::default, |value| LogFormat::parse(&value));

        let directive = env("RUST_LOG").unwrap_or_else(|| {
            if verbose {
                "lenscape=debug".to_string()
            } else {
                env("LENSCAPE_LOG_LEVEL")
                    .or_else(|| settings.and_then(|s| s.level.clone()))
                    .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
            }
        });
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
            tracing::warn!(directive = %directive, error = %e, "Invalid log filter, using default");
            EnvFilter::new(DEFAULT_LOG_FILTER)
        });

        let file = env("LENSCAPE_LOG_FILE")
            .map(PathBuf::from)
            .or_else(|| settings.and_then(|s| s.file.clone()));

        Self {
            format,
            filter,
            file,
        }
    }
}
