//! Error types for reconciliation and execution

use std::path::PathBuf;
use thiserror::Error;

use crate::error_codes;

/// Batch-level failures. Only these reach the caller; per-file problems are
/// absorbed into the [`SyncOutcome`](crate::sync_engine::SyncOutcome).
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch remote listing: {0}")]
    RemoteList(#[source] RemoteError),

    #[error("Invalid folder selection: {0}")]
    InvalidSelection(String),

    #[error("No sync plan available, analyze the folder first")]
    NoPlan,

    #[error("Failed to fetch {name}: {message}")]
    Fetch { name: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::RemoteList(_) => error_codes::ERR_REMOTE_LIST_FAILED,
            SyncError::InvalidSelection(_) => error_codes::ERR_INVALID_SELECTION,
            SyncError::NoPlan => error_codes::ERR_NO_PLAN,
            SyncError::Fetch { .. } => error_codes::ERR_FETCH_FAILED,
            SyncError::Config(_) | SyncError::Yaml(_) => error_codes::ERR_CONFIG_INVALID,
            SyncError::Io(_) => error_codes::ERR_IO,
        }
    }
}

/// Failure of a single call against the remote file store.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

/// A scoped filesystem write was refused or failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to write {path:?}: {message}")]
pub struct WriteError {
    pub path: PathBuf,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, SyncError>;
