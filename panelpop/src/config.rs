use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://serve.panelpop.co/";
pub const DEFAULT_MARKER_FILENAME: &str = "panelpop_inactive.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Platform identifier sent with every fetch unless overridden.
pub const DEFAULT_PLATFORM: i32 = 0;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("app key cannot be empty")]
    EmptyAppKey,

    #[error("request timeout cannot be 0")]
    InvalidTimeout,

    #[error("marker filename cannot be empty")]
    EmptyFilename,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Where the deactivation marker lives.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum MarkerStoreType {
    Filesystem {
        base_dir: PathBuf,
        #[serde(default = "default_marker_filename")]
        filename: String,
    },
    /// Keeps the marker in memory only. A tripped gate is forgotten on restart.
    Memory,
}

/// Client configuration. Immutable once a session has been created from it.
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Config {
    /// Opaque credential sent in the `AppKey` header.
    pub app_key: String,
    /// Base URL of the panel API. Only scheme, host and port are used; the
    /// request path replaces any path present here.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_platform")]
    pub platform: i32,
    pub storage: MarkerStoreType,
}

impl Config {
    /// Config with default endpoint and timeout, persisting the deactivation
    /// marker under `data_dir`.
    pub fn new<K, D>(app_key: K, data_dir: D) -> Self
    where
        K: Into<String>,
        D: Into<PathBuf>,
    {
        Config {
            app_key: app_key.into(),
            api_url: default_api_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            platform: DEFAULT_PLATFORM,
            storage: MarkerStoreType::Filesystem {
                base_dir: data_dir.into(),
                filename: default_marker_filename(),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_key.is_empty() {
            return Err(ValidationError::EmptyAppKey);
        }

        if self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if let MarkerStoreType::Filesystem { filename, .. } = &self.storage
            && filename.is_empty()
        {
            return Err(ValidationError::EmptyFilename);
        }

        Ok(())
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_marker_filename() -> String {
    DEFAULT_MARKER_FILENAME.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_platform() -> i32 {
    DEFAULT_PLATFORM
}
