//! Observability: structured logging and Prometheus metrics.

mod logging;
mod metrics;

pub use logging::{DEFAULT_LOG_FILTER, LogFormat, LoggingConfig};
pub use metrics::{MetricsConfig, MetricsHandle, install_prometheus};

use crate::config::LenscapeConfig;
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Full observability configuration.
#[derive(Debug)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Metrics configuration.
    pub metrics: MetricsConfig,
}

/// Options for initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
}

/// Handle for observability runtime components.
#[derive(Debug)]
pub struct ObservabilityHandle {
    metrics: Option<MetricsHandle>,
}

impl ObservabilityHandle {
    /// The installed metrics recorder, if metrics are enabled.
    #[must_use]
    pub const fn metrics(&self) -> Option<&MetricsHandle> {
        self.metrics.as_ref()
    }
}

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

/// Initializes observability using environment variables only.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// component fails to initialize.
pub fn init_from_env(options: InitOptions) -> Result<ObservabilityHandle> {
    init(ObservabilityConfig {
        logging: LoggingConfig::from_env(options.verbose),
        metrics: MetricsConfig::from_env(),
    })
}

/// Initializes observability from loaded configuration with env overrides.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// component fails to initialize.
pub fn init_from_config(
    config: &LenscapeConfig,
    options: InitOptions,
) -> Result<ObservabilityHandle> {
    init(ObservabilityConfig {
        logging: LoggingConfig::from_settings(Some(&config.logging), options.verbose),
        metrics: MetricsConfig::from_settings(Some(&config.metrics)),
    })
}

/// Initializes logging and metrics for the process.
///
/// Logs go to stderr unless a file is configured, keeping stdout free for
/// command output. Pretty output also logs span durations on close, which
/// times every search and sequencing call.
///
/// # Errors
///
/// Returns an error if observability has already been initialized or if any
/// component fails to initialize.
pub fn init(config: ObservabilityConfig) -> Result<ObservabilityHandle> {
    if OBSERVABILITY_INIT.get().is_some() {
        return Err(Error::operation(
            "observability_init",
            "observability already initialized",
        ));
    }

    let sink = LogSink::open(config.logging.file.as_deref())?;
    let fmt = tracing_subscriber::fmt::layer()
        .with_ansi(sink.ansi())
        .with_target(true)
        .with_writer(sink.into_make_writer());
    let registry = tracing_subscriber::registry().with(config.logging.filter);

    let installed = match config.logging.format {
        LogFormat::Json => registry
            .with(fmt.json().with_current_span(true).with_span_list(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt.with_span_events(FmtSpan::CLOSE))
            .try_init(),
    };
    installed.map_err(|e| Error::operation("observability_init", e))?;

    let metrics = install_prometheus(&config.metrics)?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| Error::operation("observability_init", "failed to mark observability initialized"))?;

    Ok(ObservabilityHandle { metrics })
}

/// Destination for formatted log lines.
#[derive(Debug)]
enum LogSink {
    Stderr,
    File(Mutex<File>),
}

impl LogSink {
    /// Stderr, or `path` opened for appending with parent directories created.
    fn open(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stderr);
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::operation("create_log_dir", e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::operation("open_log_file", format!("{}: {e}", path.display())))?;
        Ok(Self::File(Mutex::new(file)))
    }

    /// Colors only for an interactive stderr.
    fn ansi(&self) -> bool {
        matches!(self, Self::Stderr) && io::stderr().is_terminal()
    }

    fn into_make_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stderr => BoxMakeWriter::new(io::stderr),
            Self::File(file) => BoxMakeWriter::new(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_file_sink_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("lenscape.log");

        let first = LogSink::open(Some(&path)).unwrap().into_make_writer();
        first.make_writer().write_all(b"first\n").unwrap();
        let again = LogSink::open(Some(&path)).unwrap();
        assert!(!again.ansi());
        let again = again.into_make_writer();
        let mut writer = again.make_writer();
        writer.write_all(b"second\n").unwrap();
        writer.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_no_path_means_stderr() {
        assert!(matches!(LogSink::open(None).unwrap(), LogSink::Stderr));
    }
}
