//! Client configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::Error;

pub const DEFAULT_BASE_URL: &str = "https://todo-list.dcism.org";
pub const DEFAULT_DATA_DIR: &str = ".todo-data";

/// How the task collection is fetched on refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// One list request without a status filter
    #[default]
    Combined,
    /// One list request per status, issued concurrently and concatenated
    SplitByStatus,
}

impl FromStr for RefreshMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "combined" => Ok(Self::Combined),
            "split" | "split_by_status" => Ok(Self::SplitByStatus),
            _ => Err(Error::validation(format!(
                "Unsupported refresh mode '{}'",
                value
            ))),
        }
    }
}

/// Configuration for the API client and the stores
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote service, without trailing slash
    pub base_url: String,
    /// Directory holding the session snapshot file
    pub data_dir: PathBuf,
    pub refresh_mode: RefreshMode,
    /// Transport-level timeout; `None` keeps the HTTP client's default
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            refresh_mode: RefreshMode::default(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build from `TODO_API_URL`, `TODO_DATA_DIR`, `TODO_REFRESH_MODE` and
    /// `TODO_REQUEST_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TODO_API_URL") {
            config = config.with_base_url(url);
        }
        if let Ok(dir) = std::env::var("TODO_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(mode) = std::env::var("TODO_REFRESH_MODE") {
            config.refresh_mode = mode.parse()?;
        }
        if let Ok(secs) = std::env::var("TODO_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::validation(format!("Invalid TODO_REQUEST_TIMEOUT_SECS '{}'", secs))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the refresh mode
    pub fn with_refresh_mode(mut self, mode: RefreshMode) -> Self {
        self.refresh_mode = mode;
        self
    }

    /// Set the transport timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
