use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Readable byte source behind a selected file.
#[derive(Debug, Clone)]
pub enum FileHandle {
    /// File on disk; absolute paths double as the download-target hint.
    Disk(PathBuf),
    /// Content already held in memory (browser picker, tests).
    Memory(Arc<[u8]>),
}

impl FileHandle {
    pub fn absolute_path(&self) -> Option<&Path> {
        match self {
            FileHandle::Disk(path) if path.is_absolute() => Some(path.as_path()),
            _ => None,
        }
    }

    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match self {
            FileHandle::Disk(path) => tokio::fs::read(path).await,
            FileHandle::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// One entry of a folder selection, before the comparison key is derived.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Folder-relative path (`folder/sub/file.txt`), when the picker gives one.
    pub relative_path: Option<String>,
    pub handle: FileHandle,
    pub mime_type: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn in_memory(relative_path: &str, bytes: &[u8]) -> Self {
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path)
            .to_string();
        Self {
            mime_type: super::inventory::mime_hint_for(&name),
            name,
            relative_path: Some(relative_path.to_string()),
            size: bytes.len() as u64,
            handle: FileHandle::Memory(Arc::from(bytes)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalFileRecord {
    /// Comparison key: last segment of the folder-relative path.
    pub relative_name: String,
    pub handle: FileHandle,
    pub mime_hint: String,
    pub size: u64,
}

/// Server-assigned identifier, opaque to the sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileRecord {
    pub name: String,
    pub file_id: FileId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uploader_name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Disjoint upload/download name sets for one folder selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPlan {
    pub to_upload: Vec<String>,
    pub to_download: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_upload.is_empty() && self.to_download.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureKind {
    Upload,
    Download,
    Write,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncFailure {
    pub name: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncOutcome {
    pub uploaded_count: usize,
    pub skipped_count: usize,
    pub downloaded_count: usize,
    pub failures: Vec<SyncFailure>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncPhase {
    Uploading,
    Downloading,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub phase: SyncPhase,
    pub current_file: Option<String>,
    pub processed_files: usize,
    pub total_files: usize,
}
