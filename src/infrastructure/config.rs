//! Settings loading for reviewdesk.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, environment
//! variables, then command-line flags (applied by the caller).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_API_URL: &str = "REVIEWDESK_API_URL";
pub const ENV_TOKEN_FILE: &str = "REVIEWDESK_TOKEN_FILE";
pub const ENV_LOG_DIR: &str = "REVIEWDESK_LOG_DIR";

const APP_DIR: &str = "reviewdesk";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the backend API, including the `/api` path.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Dashboard polling interval.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default = "default_queue_page_size")]
    pub queue_page_size: u32,

    #[serde(default = "default_recent_jobs_limit")]
    pub recent_jobs_limit: u32,

    /// Look-back window for graphrag and cost metrics.
    #[serde(default = "default_metrics_days")]
    pub metrics_days: u32,

    #[serde(default = "default_audit_limit")]
    pub audit_limit: u32,

    /// Where the bearer token is kept.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    30
}

fn default_queue_page_size() -> u32 {
    20
}

fn default_recent_jobs_limit() -> u32 {
    10
}

fn default_metrics_days() -> u32 {
    30
}

fn default_audit_limit() -> u32 {
    100
}

fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_token_file() -> PathBuf {
    app_dir().join("auth_token")
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR).join("logs"))
        .unwrap_or_else(|| app_dir().join("logs"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            queue_page_size: default_queue_page_size(),
            recent_jobs_limit: default_recent_jobs_limit(),
            metrics_days: default_metrics_days(),
            audit_limit: default_audit_limit(),
            token_file: default_token_file(),
            log_dir: default_log_dir(),
        }
    }
}

impl Settings {
    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        app_dir().join("config.toml")
    }

    /// Loads settings from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads `path` if given, else the default file if it exists, else the
    /// defaults. An explicit path that is missing is an error.
    pub fn resolve(path: Option<&Path>) -> ConfigResult<Self> {
        let mut settings = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Applies environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(file) = lookup(ENV_TOKEN_FILE).filter(|v| !v.trim().is_empty()) {
            self.token_file = PathBuf::from(file);
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|v| !v.trim().is_empty()) {
            self.log_dir = PathBuf::from(dir);
        }
        self.validate()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "api_base_url".to_string(),
                value: self.api_base_url.clone(),
            });
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "refresh_interval_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.queue_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "queue_page_size".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Writes the settings as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        let contents = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(path, contents).map_err(|e| write_err(e.to_string()))
    }
}
