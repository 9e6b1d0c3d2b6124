//! Local inventory collection
//!
//! Turns a folder selection into comparison-keyed records and, on hosts
//! that can write to disk, remembers where downloads should land.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::capability::{parent_directory, HostCapability};
use crate::errors::{Result, SyncError};
use crate::path_validation::{validate_path, verify_path_exists};
use crate::sync_engine::types::{FileHandle, LocalFileRecord, SelectedFile};

#[derive(Debug, Clone, Default)]
pub struct LocalInventory {
    pub records: Vec<LocalFileRecord>,
    /// Download destination; only set when the host can write files.
    pub target_dir: Option<PathBuf>,
}

impl LocalInventory {
    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.relative_name.clone()).collect()
    }

    /// First record carrying `name`; later duplicates are shadowed.
    pub fn find(&self, name: &str) -> Option<&LocalFileRecord> {
        find_record(&self.records, name)
    }
}

pub fn find_record<'a>(records: &'a [LocalFileRecord], name: &str) -> Option<&'a LocalFileRecord> {
    records.iter().find(|r| r.relative_name == name)
}

/// Last segment of the relative path if present, else the bare name.
pub fn comparison_key(file: &SelectedFile) -> String {
    let full_path = file
        .relative_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(&file.name);
    full_path.rsplit('/').next().unwrap_or(full_path).to_string()
}

/// Build the inventory for one folder selection.
///
/// Output order matches input order and duplicates are kept.
pub fn collect(selection: Vec<SelectedFile>, capability: &HostCapability) -> LocalInventory {
    let target_dir = if capability.has_filesystem_write() {
        selection
            .iter()
            .find_map(|f| f.handle.absolute_path())
            .map(|path| PathBuf::from(parent_directory(&path.to_string_lossy())))
            .filter(|dir| !dir.as_os_str().is_empty())
    } else {
        None
    };

    let records = selection
        .into_iter()
        .map(|file| LocalFileRecord {
            relative_name: comparison_key(&file),
            mime_hint: file.mime_type,
            size: file.size,
            handle: file.handle,
        })
        .collect();

    LocalInventory { records, target_dir }
}

/// Walk `root` and produce the selection a folder picker would hand over.
pub fn select_folder(root: &Path, exclude_patterns: &[String]) -> Result<Vec<SelectedFile>> {
    validate_path(&root.to_string_lossy()).map_err(SyncError::InvalidSelection)?;
    verify_path_exists(root).map_err(SyncError::InvalidSelection)?;
    if !root.is_dir() {
        return Err(SyncError::InvalidSelection(format!(
            "Not a directory: {}",
            root.display()
        )));
    }

    let root = root.canonicalize()?;
    let folder_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let excludes = build_exclude_set(exclude_patterns)?;

    let mut selection = Vec::new();

    for entry in WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let sub_path = path
            .strip_prefix(&root)
            .map_err(|e| SyncError::InvalidSelection(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");

        if excludes.is_match(&sub_path) {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let relative_path = if folder_name.is_empty() {
            sub_path
        } else {
            format!("{folder_name}/{sub_path}")
        };

        selection.push(SelectedFile {
            mime_type: mime_hint_for(&name),
            name,
            relative_path: Some(relative_path),
            handle: FileHandle::Disk(path.to_path_buf()),
            size,
        });
    }

    // Shallow entries first so the download target resolves to the folder
    // itself whenever it holds files directly.
    selection.sort_by_key(|f| f.relative_path.as_deref().map_or(0, |p| p.matches('/').count()));

    Ok(selection)
}

fn build_exclude_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        let glob = Glob::new(pattern)
            .map_err(|e| SyncError::Config(format!("Invalid glob pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| SyncError::Config(e.to_string()))
}

/// MIME hint from the file extension, used as the upload content type.
pub fn mime_hint_for(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
