//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `LENSCAPE_*` environment variables. [`LenscapeConfig::load`] applies
//! all three and validates the result.

use crate::embedding::{
    FaceDetectionOptions, ImageEncodingOptions, MachineLearningClient, MachineLearningHttpConfig,
};
use crate::models::DEFAULT_MAX_RESULTS;
use crate::services::{DEFAULT_CHAINING_LIMIT, ImageSearchSettings};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for lenscape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LenscapeConfig {
    /// Machine-learning service settings.
    pub machine_learning: MachineLearningSettings,
    /// Image search settings.
    pub search: SearchSettings,
    /// Sequencing settings.
    pub sequencing: SequencingSettings,
    /// File locations.
    pub storage: StorageSettings,
    /// Logging settings (resolved by the observability module).
    pub logging: LoggingSettings,
    /// Metrics settings (resolved by the observability module).
    pub metrics: MetricsSettings,
}

/// Machine-learning service settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineLearningSettings {
    /// Service base URL.
    pub url: String,
    /// Request timeout in milliseconds (0 disables it).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 disables it).
    pub connect_timeout_ms: u64,
    /// Face detection and recognition.
    pub facial_recognition: FacialRecognitionSettings,
    /// Whole-image encoding.
    pub clip: ClipSettings,
}

/// Face detection and recognition settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacialRecognitionSettings {
    /// Model name.
    pub model_name: String,
    /// First (strictest) detection threshold.
    pub min_score: f32,
    /// First (strictest) match distance ceiling.
    pub max_distance: f32,
}

/// Whole-image encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipSettings {
    /// Whether content search is available.
    pub enabled: bool,
    /// Model name.
    pub model_name: String,
}

/// Image search settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSettings {
    /// Result cap used when the caller does not give one.
    pub default_max_results: usize,
    /// Detection thresholds tried after `min_score`, in order.
    pub detection_fallbacks: Vec<f32>,
    /// Distance ceiling tried after `max_distance` when it is larger.
    pub distance_floor: f32,
}

/// Sequencing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequencingSettings {
    /// Largest embedded set ordered by nearest-neighbor chaining.
    pub chaining_limit: usize,
}

/// File locations.
///
/// Paths left unset are derived from `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSettings {
    /// Base directory for lenscape data.
    pub data_dir: PathBuf,
    /// Directory for transient uploaded images.
    pub upload_dir: Option<PathBuf>,
    /// JSON catalog document.
    pub catalog_path: Option<PathBuf>,
    /// Person ratings (NDJSON).
    pub ratings_path: Option<PathBuf>,
    /// Tag taxonomy (JSON).
    pub tags_path: Option<PathBuf>,
    /// Root that relative asset paths are stored under.
    pub library_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Directory for transient uploaded images.
    #[must_use]
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("upload"))
    }

    /// JSON catalog document.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("catalog.json"))
    }

    /// Person ratings file.
    #[must_use]
    pub fn ratings_path(&self) -> PathBuf {
        self.ratings_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("person-rates.ndjson"))
    }

    /// Tag taxonomy file.
    #[must_use]
    pub fn tags_path(&self) -> PathBuf {
        self.tags_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("tags.json"))
    }

    /// Library root; each owner's relative asset paths live under
    /// `<library_dir>/<owner id>`.
    #[must_use]
    pub fn library_dir(&self) -> PathBuf {
        self.library_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("library"))
    }
}

/// Logging settings from config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive, for example `lenscape=debug`.
    pub level: Option<String>,
    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Metrics settings from config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Whether metrics are enabled.
    pub enabled: Option<bool>,
    /// Prometheus text file written when a command finishes.
    pub file: Option<PathBuf>,
}

impl Default for LenscapeConfig {
    fn default() -> Self {
        Self {
            machine_learning: MachineLearningSettings {
                url: MachineLearningClient::DEFAULT_ENDPOINT.to_string(),
                timeout_ms: MachineLearningHttpConfig::default().timeout_ms,
                connect_timeout_ms: MachineLearningHttpConfig::default().connect_timeout_ms,
                facial_recognition: FacialRecognitionSettings {
                    model_name: "buffalo_l".to_string(),
                    min_score: 0.7,
                    max_distance: 0.5,
                },
                clip: ClipSettings {
                    enabled: true,
                    model_name: "ViT-B-32__openai".to_string(),
                },
            },
            search: SearchSettings {
                default_max_results: DEFAULT_MAX_RESULTS,
                detection_fallbacks: vec![0.5, 0.35],
                distance_floor: 0.6,
            },
            sequencing: SequencingSettings {
                chaining_limit: DEFAULT_CHAINING_LIMIT,
            },
            storage: StorageSettings {
                data_dir: PathBuf::from(".lenscape"),
                upload_dir: None,
                catalog_path: None,
                ratings_path: None,
                tags_path: None,
                library_dir: None,
            },
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Machine-learning section.
    pub machine_learning: Option<ConfigFileMachineLearning>,
    /// Search section.
    pub search: Option<ConfigFileSearch>,
    /// Sequencing section.
    pub sequencing: Option<ConfigFileSequencing>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
    /// Metrics section.
    pub metrics: Option<MetricsSettings>,
}

/// Machine-learning section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMachineLearning {
    /// Service URL.
    pub url: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Face settings.
    pub facial_recognition: Option<ConfigFileFacialRecognition>,
    /// Encoder settings.
    pub clip: Option<ConfigFileClip>,
}

/// Facial recognition section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFacialRecognition {
    /// Model name.
    pub model_name: Option<String>,
    /// Detection threshold.
    pub min_score: Option<f32>,
    /// Match distance ceiling.
    pub max_distance: Option<f32>,
}

/// Clip section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileClip {
    /// Enabled flag.
    pub enabled: Option<bool>,
    /// Model name.
    pub model_name: Option<String>,
}

/// Search section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSearch {
    /// Default result cap.
    pub default_max_results: Option<usize>,
    /// Detection fallbacks.
    pub detection_fallbacks: Option<Vec<f32>>,
    /// Distance floor.
    pub distance_floor: Option<f32>,
}

/// Sequencing section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSequencing {
    /// Chaining limit.
    pub chaining_limit: Option<usize>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Upload directory.
    pub upload_dir: Option<String>,
    /// Catalog path.
    pub catalog_path: Option<String>,
    /// Ratings path.
    pub ratings_path: Option<String>,
    /// Tags path.
    pub tags_path: Option<String>,
    /// Library root.
    pub library_dir: Option<String>,
}

impl LenscapeConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the effective configuration.
    ///
    /// Reads `path` when given (it must exist), otherwise the default
    /// location; then applies environment overrides and validates. Problems
    /// that did not stop the load are logged at warn level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if an explicit path does not exist, and an
    /// error if the file cannot be parsed or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config, warnings) = Self::load_with_warnings(path)?;
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Configuration warning");
        }
        Ok(config)
    }

    /// Like [`Self::load`], but hands back the non-fatal problems instead of
    /// logging them.
    ///
    /// Callers that install logging after loading use this to report
    /// skipped config files and ignored overrides once a subscriber exists.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_warnings(path: Option<&Path>) -> Result<(Self, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut config = match path {
            Some(path) if !path.exists() => {
                return Err(Error::NotFound(format!(
                    "config file {}",
                    path.display()
                )));
            },
            Some(path) => Self::load_from_file(path)?,
            None => Self::discover(&mut warnings),
        };
        warnings.extend(config.apply_env_overrides());
        config.validate()?;
        Ok((config, warnings))
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::operation("read_config_file", e))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir first, then `~/.config/lenscape/`.
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let mut warnings = Vec::new();
        let config = Self::discover(&mut warnings);
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Configuration warning");
        }
        config
    }

    fn discover(warnings: &mut Vec<String>) -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("lenscape").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("lenscape")
                .join("config.toml"),
        ];

        for candidate in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(candidate) {
                Ok(config) => return config,
                Err(e) => warnings.push(format!(
                    "ignoring unreadable config file {}: {e}",
                    candidate.display()
                )),
            }
        }

        let mut config = Self::default();
        config.storage.data_dir = base_dirs.data_dir().join("lenscape");
        config
    }

    /// Converts a `ConfigFile` to `LenscapeConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(ml) = file.machine_learning {
            let target = &mut config.machine_learning;
            if let Some(url) = ml.url {
                target.url = url;
            }
            if let Some(v) = ml.timeout_ms {
                target.timeout_ms = v;
            }
            if let Some(v) = ml.connect_timeout_ms {
                target.connect_timeout_ms = v;
            }
            if let Some(face) = ml.facial_recognition {
                if let Some(v) = face.model_name {
                    target.facial_recognition.model_name = v;
                }
                if let Some(v) = face.min_score {
                    target.facial_recognition.min_score = v;
                }
                if let Some(v) = face.max_distance {
                    target.facial_recognition.max_distance = v;
                }
            }
            if let Some(clip) = ml.clip {
                if let Some(v) = clip.enabled {
                    target.clip.enabled = v;
                }
                if let Some(v) = clip.model_name {
                    target.clip.model_name = v;
                }
            }
        }
        if let Some(search) = file.search {
            if let Some(v) = search.default_max_results {
                config.search.default_max_results = v;
            }
            if let Some(v) = search.detection_fallbacks {
                config.search.detection_fallbacks = v;
            }
            if let Some(v) = search.distance_floor {
                config.search.distance_floor = v;
            }
        }
        if let Some(v) = file.sequencing.and_then(|s| s.chaining_limit) {
            config.sequencing.chaining_limit = v;
        }
        if let Some(storage) = file.storage {
            if let Some(v) = storage.data_dir {
                config.storage.data_dir = PathBuf::from(v);
            }
            config.storage.upload_dir = storage.upload_dir.map(PathBuf::from);
            config.storage.catalog_path = storage.catalog_path.map(PathBuf::from);
            config.storage.ratings_path = storage.ratings_path.map(PathBuf::from);
            config.storage.tags_path = storage.tags_path.map(PathBuf::from);
            config.storage.library_dir = storage.library_dir.map(PathBuf::from);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(metrics) = file.metrics {
            config.metrics = metrics;
        }

        config
    }

    /// Applies `LENSCAPE_*` environment variable overrides.
    ///
    /// Returns a warning for every value that was ignored.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// Values that do not parse are left at their previous setting and
    /// reported in the returned list.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut warnings = Vec::new();

        let ml = &mut self.machine_learning;
        if let Some(v) = lookup("LENSCAPE_ML_URL") {
            ml.url = v;
        }
        override_parsed(&lookup, &mut warnings, "LENSCAPE_ML_TIMEOUT_MS", &mut ml.timeout_ms);
        override_parsed(
            &lookup,
            &mut warnings,
            "LENSCAPE_ML_CONNECT_TIMEOUT_MS",
            &mut ml.connect_timeout_ms,
        );
        if let Some(v) = lookup("LENSCAPE_FACE_MODEL") {
            ml.facial_recognition.model_name = v;
        }
        override_parsed(
            &lookup,
            &mut warnings,
            "LENSCAPE_FACE_MIN_SCORE",
            &mut ml.facial_recognition.min_score,
        );
        override_parsed(
            &lookup,
            &mut warnings,
            "LENSCAPE_FACE_MAX_DISTANCE",
            &mut ml.facial_recognition.max_distance,
        );
        if let Some(v) = lookup("LENSCAPE_CLIP_ENABLED") {
            let v = v.to_lowercase();
            ml.clip.enabled = v == "true" || v == "1" || v == "yes";
        }
        if let Some(v) = lookup("LENSCAPE_CLIP_MODEL") {
            ml.clip.model_name = v;
        }

        override_parsed(
            &lookup,
            &mut warnings,
            "LENSCAPE_MAX_RESULTS",
            &mut self.search.default_max_results,
        );
        override_parsed(
            &lookup,
            &mut warnings,
            "LENSCAPE_CHAINING_LIMIT",
            &mut self.sequencing.chaining_limit,
        );

        let storage = &mut self.storage;
        if let Some(v) = lookup("LENSCAPE_DATA_DIR") {
            storage.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LENSCAPE_UPLOAD_DIR") {
            storage.upload_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LENSCAPE_CATALOG_PATH") {
            storage.catalog_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LENSCAPE_RATINGS_PATH") {
            storage.ratings_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LENSCAPE_TAGS_PATH") {
            storage.tags_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LENSCAPE_LIBRARY_DIR") {
            storage.library_dir = Some(PathBuf::from(v));
        }
        warnings
    }

    /// Checks that thresholds and limits are in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        let face = &self.machine_learning.facial_recognition;
        check_unit("machine_learning.facial_recognition.min_score", face.min_score)?;
        for score in &self.search.detection_fallbacks {
            check_unit("search.detection_fallbacks", *score)?;
        }
        check_distance(
            "machine_learning.facial_recognition.max_distance",
            face.max_distance,
        )?;
        check_distance("search.distance_floor", self.search.distance_floor)?;
        if self.sequencing.chaining_limit == 0 {
            return Err(Error::InvalidInput(
                "sequencing.chaining_limit must be positive".to_string(),
            ));
        }
        if self.machine_learning.url.trim().is_empty() {
            return Err(Error::InvalidInput(
                "machine_learning.url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// HTTP settings for the machine-learning client.
    #[must_use]
    pub const fn http_config(&self) -> MachineLearningHttpConfig {
        MachineLearningHttpConfig {
            timeout_ms: self.machine_learning.timeout_ms,
            connect_timeout_ms: self.machine_learning.connect_timeout_ms,
        }
    }

    /// Settings for the image search service.
    #[must_use]
    pub fn image_search_settings(&self) -> ImageSearchSettings {
        let ml = &self.machine_learning;
        ImageSearchSettings {
            face: FaceDetectionOptions {
                model_name: ml.facial_recognition.model_name.clone(),
                min_score: ml.facial_recognition.min_score,
            },
            encoding: ImageEncodingOptions {
                model_name: ml.clip.model_name.clone(),
                enabled: ml.clip.enabled,
            },
            detection_fallbacks: self.search.detection_fallbacks.clone(),
            max_distance: ml.facial_recognition.max_distance,
            distance_floor: self.search.distance_floor,
        }
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = path.into();
        self
    }
}

fn override_parsed<T, F>(lookup: &F, warnings: &mut Vec<String>, key: &str, target: &mut T)
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => warnings.push(format!("ignoring unparseable {key}={raw}")),
    }
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_distance(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}
