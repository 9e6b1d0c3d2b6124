//! Direct filesystem writes for desktop hosts
//!
//! Only reachable through [`HostCapability::FullSync`](crate::capability::HostCapability).

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

use crate::errors::WriteError;

/// Scoped capability to write a byte buffer to an absolute path.
#[async_trait]
pub trait FileWriter: Send + Sync {
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), WriteError>;
}

/// Writes straight to the local disk.
///
/// Refuses relative paths and never creates missing parent directories: the
/// destination folder is the one the user selected, so it must already exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileWriter;

impl LocalFileWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileWriter for LocalFileWriter {
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
        let fail = |message: String| WriteError {
            path: path.to_path_buf(),
            message,
        };

        if !path.is_absolute() {
            return Err(fail("destination is not an absolute path".to_string()));
        }

        match path.parent() {
            Some(parent) if parent.is_dir() => {}
            _ => return Err(fail("destination directory does not exist".to_string())),
        }

        fs::write(path, bytes).await.map_err(|e| fail(e.to_string()))
    }
}
