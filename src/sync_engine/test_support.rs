//! In-memory collaborators for executor and session tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::{RemoteError, WriteError};
use crate::fs_writer::FileWriter;
use crate::remote::RemoteStore;
use crate::sync_engine::types::{FileId, RemoteFileRecord};

/// Behaves like the file server: uploads become listable, names are unique.
#[derive(Default)]
pub struct MemoryRemote {
    files: Mutex<Vec<(RemoteFileRecord, Vec<u8>)>>,
    next_id: AtomicUsize,
    pub fail_uploads: HashSet<String>,
    pub fail_downloads: HashSet<String>,
    pub fail_list: AtomicBool,
    pub upload_calls: Mutex<Vec<String>>,
    pub download_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl MemoryRemote {
    pub fn with_files(files: &[(&str, &[u8])]) -> Self {
        let remote = Self::default();
        for (name, bytes) in files {
            remote.insert(name, bytes.to_vec());
        }
        remote
    }

    pub fn failing_uploads(mut self, names: &[&str]) -> Self {
        self.fail_uploads = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing_downloads(mut self, names: &[&str]) -> Self {
        self.fail_downloads = names.iter().map(|n| n.to_string()).collect();
        self
    }

    fn insert(&self, name: &str, bytes: Vec<u8>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        let record = RemoteFileRecord {
            name: name.to_string(),
            file_id: FileId(id),
            uploader_name: "tester".to_string(),
            size: Some(bytes.len() as u64),
        };
        self.files.lock().unwrap().push((record, bytes));
    }

    pub fn names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.name.clone())
            .collect()
    }

    pub fn content(&self, name: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r.name == name)
            .map(|(_, b)| b.clone())
    }

    pub fn uploads(&self) -> Vec<String> {
        self.upload_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn list_files(&self) -> Result<Vec<RemoteFileRecord>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RemoteError::Other("listing unavailable".to_string()));
        }
        Ok(self.files.lock().unwrap().iter().map(|(r, _)| r.clone()).collect())
    }

    async fn upload_file(&self, name: &str, _mime_type: &str, bytes: Vec<u8>) -> Result<(), RemoteError> {
        self.upload_calls.lock().unwrap().push(name.to_string());
        tokio::task::yield_now().await;

        if self.fail_uploads.contains(name) {
            return Err(RemoteError::Status {
                status: 500,
                message: format!("upload of {name} rejected"),
            });
        }
        if self.files.lock().unwrap().iter().any(|(r, _)| r.name == name) {
            return Err(RemoteError::Status {
                status: 400,
                message: "File with this name already exists".to_string(),
            });
        }

        self.insert(name, bytes);
        Ok(())
    }

    async fn download_file(&self, file_id: &FileId) -> Result<Vec<u8>, RemoteError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let files = self.files.lock().unwrap();
        let (record, bytes) = files
            .iter()
            .find(|(r, _)| r.file_id == *file_id)
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                message: "File not found".to_string(),
            })?;

        if self.fail_downloads.contains(&record.name) {
            return Err(RemoteError::Other(format!("connection reset while fetching {}", record.name)));
        }
        Ok(bytes.clone())
    }
}

/// Captures writes instead of touching the disk.
#[derive(Default)]
pub struct RecordingWriter {
    pub writes: Mutex<HashMap<PathBuf, Vec<u8>>>,
    pub fail_paths: HashSet<PathBuf>,
}

impl RecordingWriter {
    pub fn written(&self) -> HashMap<PathBuf, Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileWriter for RecordingWriter {
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
        if self.fail_paths.contains(path) {
            return Err(WriteError {
                path: path.to_path_buf(),
                message: "permission denied".to_string(),
            });
        }
        self.writes
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}
