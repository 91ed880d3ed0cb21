//! Runtime configuration for storage location and activity logging.
//!
//! Configuration can be loaded from a TOML file, environment variables, or
//! built programmatically on top of the defaults.

use crate::activity::{ActivityLog, HttpActivityLog, NoopActivityLog};
use crate::store::{MeasureStore, NamespacedStorage};
use measure_storage::{is_valid_namespace, Storage, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATA_DIR: &str = "FIELDMEASURE_DATA_DIR";
pub const ENV_NAMESPACE: &str = "FIELDMEASURE_NAMESPACE";
pub const ENV_ACTIVITY_URL: &str = "FIELDMEASURE_ACTIVITY_URL";
pub const ENV_ACTIVITY_TOKEN: &str = "FIELDMEASURE_ACTIVITY_TOKEN";
pub const ENV_ACTIVITY_TIMEOUT_SECS: &str = "FIELDMEASURE_ACTIVITY_TIMEOUT_SECS";

const DEFAULT_ACTIVITY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyConfig {
    /// Directory holding one JSON file per namespace
    pub data_dir: PathBuf,
    /// Storage namespace, also the file stem of the measure file
    pub namespace: String,
    /// Base URL of the activity endpoint; `None` disables activity logging
    pub activity_endpoint: Option<String>,
    /// Bearer token sent with activity records
    pub activity_token: Option<String>,
    pub activity_timeout: Duration,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            namespace: DEFAULT_NAMESPACE.to_owned(),
            activity_endpoint: None,
            activity_token: None,
            activity_timeout: Duration::from_secs(DEFAULT_ACTIVITY_TIMEOUT_SECS),
        }
    }
}

/// On-disk TOML shape; absent keys keep their defaults
#[derive(Debug, Default, Serialize, Deserialize)]
struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_timeout_secs: Option<u64>,
}

impl SurveyConfig {
    /// Platform data directory for the application.
    ///
    /// - Linux: ~/.local/share/fieldmeasure
    /// - macOS: ~/Library/Application Support/dev.FieldMeasure.FieldMeasure
    /// - Windows: %LOCALAPPDATA%\FieldMeasure\FieldMeasure\data
    pub fn default_data_dir() -> PathBuf {
        match Storage::from_default_project() {
            Ok(storage) => storage.root().to_path_buf(),
            Err(_) => PathBuf::from("fieldmeasure-data"),
        }
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_activity_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.activity_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_activity_token(mut self, token: impl Into<String>) -> Self {
        self.activity_token = Some(token.into());
        self
    }

    pub fn with_activity_timeout(mut self, timeout: Duration) -> Self {
        self.activity_timeout = timeout;
        self
    }

    /// Loads configuration from environment variables on top of the defaults.
    ///
    /// - `FIELDMEASURE_DATA_DIR`: storage directory
    /// - `FIELDMEASURE_NAMESPACE`: storage namespace (default: field_measures)
    /// - `FIELDMEASURE_ACTIVITY_URL`: activity endpoint base URL
    /// - `FIELDMEASURE_ACTIVITY_TOKEN`: bearer token for the activity endpoint
    /// - `FIELDMEASURE_ACTIVITY_TIMEOUT_SECS`: request timeout (default: 5)
    ///
    /// # Errors
    /// Returns an error if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Apply environment overrides to an existing configuration
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(ENV_NAMESPACE) {
            if !is_valid_namespace(&val) {
                return Err(ConfigError::InvalidValue(ENV_NAMESPACE.to_owned()));
            }
            self.namespace = val;
        }

        if let Ok(val) = std::env::var(ENV_ACTIVITY_URL) {
            self.activity_endpoint = non_blank(val);
        }

        if let Ok(val) = std::env::var(ENV_ACTIVITY_TOKEN) {
            self.activity_token = non_blank(val);
        }

        if let Ok(val) = std::env::var(ENV_ACTIVITY_TIMEOUT_SECS) {
            let secs = val
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue(ENV_ACTIVITY_TIMEOUT_SECS.to_owned()))?;
            self.activity_timeout = Duration::from_secs(secs);
        }

        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// ```toml
    /// data_dir = "/var/lib/fieldmeasure"
    /// namespace = "field_measures"
    /// activity_url = "https://farm.example"
    /// activity_timeout_secs = 5
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml(&contents)
    }

    fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(toml_str)?;
        let mut config = Self::default();

        if let Some(dir) = file.data_dir {
            config.data_dir = dir;
        }
        if let Some(namespace) = file.namespace {
            if !is_valid_namespace(&namespace) {
                return Err(ConfigError::InvalidValue("namespace".to_owned()));
            }
            config.namespace = namespace;
        }
        config.activity_endpoint = file.activity_url.and_then(non_blank);
        config.activity_token = file.activity_token.and_then(non_blank);
        if let Some(secs) = file.activity_timeout_secs {
            config.activity_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml()?).map_err(ConfigError::Io)
    }

    fn to_toml(&self) -> Result<String, ConfigError> {
        let file = FileConfig {
            data_dir: Some(self.data_dir.clone()),
            namespace: Some(self.namespace.clone()),
            activity_url: self.activity_endpoint.clone(),
            activity_token: self.activity_token.clone(),
            activity_timeout_secs: Some(self.activity_timeout.as_secs()),
        };
        Ok(toml::to_string(&file)?)
    }

    pub fn storage(&self) -> Storage {
        Storage::with_root(&self.data_dir)
    }

    pub fn persistence(&self) -> NamespacedStorage {
        NamespacedStorage::new(self.storage(), self.namespace.clone())
    }

    /// HTTP activity log when an endpoint is configured, otherwise a no-op log
    pub fn activity_log(&self) -> Box<dyn ActivityLog> {
        match &self.activity_endpoint {
            Some(endpoint) => Box::new(HttpActivityLog::new(
                endpoint,
                self.activity_token.clone(),
                self.activity_timeout,
            )),
            None => Box::new(NoopActivityLog),
        }
    }

    pub fn open_store(&self) -> MeasureStore {
        MeasureStore::open(self.persistence(), self.activity_log())
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}
