//! Client configuration
//!
//! Loaded from a YAML file, then overridden by `FILESYNC_*` environment
//! variables and finally by command-line flags.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::{Result, SyncError};
use crate::input_validation::{validate_exclude_patterns, validate_server_url};
use crate::logging::DEFAULT_MAX_LOG_LINES;

pub const ENV_SERVER_URL: &str = "FILESYNC_SERVER_URL";
pub const ENV_TOKEN: &str = "FILESYNC_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub server_url: String,
    pub token: Option<String>,
    pub upload_only: bool,
    pub exclude_patterns: Vec<String>,
    pub max_log_lines: usize,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000/api".to_string(),
            token: None,
            upload_only: false,
            exclude_patterns: Vec::new(),
            max_log_lines: DEFAULT_MAX_LOG_LINES,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_SERVER_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        );
    }

    fn apply_overrides(&mut self, server_url: Option<String>, token: Option<String>) {
        if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
            self.server_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_server_url(&self.server_url).map_err(|e| SyncError::Config(e.to_string()))?;
        validate_exclude_patterns(&self.exclude_patterns)
            .map_err(|e| SyncError::Config(e.to_string()))?;

        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config("requestTimeoutSecs must be positive".to_string()));
        }
        if self.max_log_lines == 0 {
            return Err(SyncError::Config("maxLogLines must be positive".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
