//! Host capability selection
//!
//! Decided once at startup: either the host can write downloaded files
//! straight into the selected folder, or it can only upload and the user
//! fetches remote-only files by hand.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fs_writer::{FileWriter, LocalFileWriter};

#[derive(Clone)]
pub enum HostCapability {
    /// Bidirectional sync with direct filesystem writes.
    FullSync(Arc<dyn FileWriter>),
    /// Uploads only; downloads are left to the user.
    UploadOnlySync,
}

impl HostCapability {
    pub fn has_filesystem_write(&self) -> bool {
        matches!(self, HostCapability::FullSync(_))
    }

    pub fn writer(&self) -> Option<&Arc<dyn FileWriter>> {
        match self {
            HostCapability::FullSync(writer) => Some(writer),
            HostCapability::UploadOnlySync => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HostCapability::FullSync(_) => "full-sync",
            HostCapability::UploadOnlySync => "upload-only",
        }
    }
}

impl fmt::Debug for HostCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the capability for this process.
///
/// Browser (wasm) builds can never write to disk; native builds can unless
/// the user asked for upload-only.
pub fn probe_host(upload_only: bool) -> HostCapability {
    if cfg!(target_family = "wasm") || upload_only {
        HostCapability::UploadOnlySync
    } else {
        HostCapability::FullSync(Arc::new(LocalFileWriter::new()))
    }
}

pub fn join_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

/// Strip the last component, splitting on either `/` or `\`.
///
/// Returns an empty string when the path has no separator.
pub fn parent_directory(path: &str) -> String {
    match path.rfind(['/', '\\']) {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}
