//! Prometheus metrics.
//!
//! Commands are short-lived, so the recorder is scraped once at exit: the
//! rendered exposition text is written to a node-exporter style text file
//! when one is configured.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::{Path, PathBuf};

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// Text file the exposition is written to at exit.
    pub file: Option<PathBuf>,
}

impl MetricsConfig {
    /// Builds metrics configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_settings(None)
    }

    /// Builds metrics configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        Self::resolve(settings, |key| std::env::var(key).ok())
    }

    fn resolve<F>(settings: Option<&MetricsSettings>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = parse_bool(lookup("LENSCAPE_METRICS_ENABLED"))
            .or_else(|| settings.and_then(|config| config.enabled))
            .unwrap_or(false);
        let file = lookup("LENSCAPE_METRICS_FILE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| settings.and_then(|config| config.file.clone()));

        Self { enabled, file }
    }
}

/// Handle to the installed recorder.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
    file: Option<PathBuf>,
}

impl MetricsHandle {
    /// Renders the current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }

    /// Configured text file, if any.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Writes the rendered metrics to the configured text file.
    ///
    /// The file is replaced in one rename so a collector never reads a
    /// half-written exposition. Returns `Ok(false)` when no file is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn write_textfile(&self) -> Result<bool> {
        let Some(path) = self.file.as_deref() else {
            return Ok(false);
        };
        write_atomically(path, &self.render())?;
        tracing::debug!(path = %path.display(), "Wrote metrics text file");
        Ok(true)
    }
}

/// Installs the Prometheus recorder as the global `metrics` recorder.
///
/// Returns `None` when metrics are disabled.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::operation("metrics_recorder_install", e))?;

    Ok(Some(MetricsHandle {
        prometheus,
        file: config.file.clone(),
    }))
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::operation("create_metrics_dir", e))?;
    }
    let staging = path.with_extension("prom.tmp");
    fs::write(&staging, contents)
        .map_err(|e| Error::operation("write_metrics", format!("{}: {e}", staging.display())))?;
    fs::rename(&staging, path)
        .map_err(|e| Error::operation("write_metrics", format!("{}: {e}", path.display())))
}

fn parse_bool(value: Option<String>) -> Option<bool> {
    value.map(|value| {
        let value = value.trim().to_lowercase();
        value == "true" || value == "1" || value == "yes"
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn local_handle(file: Option<PathBuf>) -> MetricsHandle {
        let recorder = PrometheusBuilder::new().build_recorder();
        MetricsHandle {
            prometheus: recorder.handle(),
            file,
        }
    }

    #[test]
    fn test_metrics_registry_smoke() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            return;
        }

        metrics::counter!("test_metrics_registry_total").increment(1);
        let rendered = handle.render();
        assert!(rendered.contains("test_metrics_registry_total"));
    }

    #[test]
    fn test_disabled_by_default() {
        let config = MetricsConfig::resolve(None, |_| None);
        assert!(!config.enabled);
        assert_eq!(config.file, None);
        assert!(install_prometheus(&config).unwrap().is_none());
    }

    #[test]
    fn test_env_overrides_settings() {
        let settings = MetricsSettings {
            enabled: Some(false),
            file: Some(PathBuf::from("/var/lib/node_exporter/lenscape.prom")),
        };
        let config = MetricsConfig::resolve(Some(&settings), |key| match key {
            "LENSCAPE_METRICS_ENABLED" => Some("yes".to_string()),
            "LENSCAPE_METRICS_FILE" => Some("  ".to_string()),
            _ => None,
        });
        assert!(config.enabled);
        assert_eq!(
            config.file.as_deref(),
            Some(Path::new("/var/lib/node_exporter/lenscape.prom"))
        );
    }

    #[test]
    fn test_textfile_written_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("collector").join("lenscape.prom");
        let handle = local_handle(Some(path.clone()));

        assert!(handle.write_textfile().unwrap());
        assert!(path.exists());
        assert!(!path.with_extension("prom.tmp").exists());

        assert!(handle.write_textfile().unwrap());
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_textfile_skipped_without_path() {
        let handle = local_handle(None);
        assert!(!handle.write_textfile().unwrap());
        assert!(handle.file().is_none());
    }
}
