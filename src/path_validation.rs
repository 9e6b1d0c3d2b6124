use std::path::{Component, Path, PathBuf};

use crate::capability::join_path;

/// Maximum allowed path length for security
const MAX_PATH_LENGTH: usize = 4096;

/// Maximum length of a single file name on common filesystems
const MAX_NAME_LENGTH: usize = 255;

/// Validate that a path is safe and doesn't contain suspicious patterns
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(format!("Path too long (max {MAX_PATH_LENGTH} bytes)"));
    }

    if path.bytes().any(|b| b == 0) {
        return Err("Path contains null bytes".to_string());
    }

    if path.contains("../") || path.contains("..\\") {
        return Err("Path traversal detected (../)".to_string());
    }

    Ok(())
}

/// Validate a bare file name received from the server before it is used as
/// a local path segment.
pub fn validate_file_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("File name is empty".to_string());
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(format!("File name too long (max {MAX_NAME_LENGTH} bytes)"));
    }

    if name.bytes().any(|b| b == 0) {
        return Err("File name contains null bytes".to_string());
    }

    if name.contains('/') || name.contains('\\') {
        return Err(format!("File name contains a path separator: {name}"));
    }

    if name == "." || name == ".." {
        return Err(format!("File name is a relative path component: {name}"));
    }

    Ok(())
}

/// Join a validated file name onto the download directory, guaranteeing the
/// result stays directly inside it.
pub fn resolve_destination(target_dir: &Path, name: &str) -> Result<PathBuf, String> {
    validate_file_name(name)?;

    let destination = join_path(target_dir, name);

    let escapes = destination
        .strip_prefix(target_dir)
        .map(|rest| {
            let mut components = rest.components();
            !matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
        })
        .unwrap_or(true);

    if escapes {
        return Err(format!(
            "Destination escapes target directory: {}",
            destination.display()
        ));
    }

    Ok(destination)
}

/// Validate that a path exists and is accessible
pub fn verify_path_exists(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Path does not exist: {}", path.display()));
    }

    Ok(())
}
