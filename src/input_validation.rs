//! Validation of user-supplied configuration and arguments
//!
//! Rejects malformed exclusion globs, server URLs and credentials before
//! they reach the collector or the HTTP client.

use anyhow::{Result, bail};

/// Validate and sanitize exclude patterns
///
/// Ensures patterns are safe, properly formatted, and within reasonable limits.
pub fn validate_exclude_patterns(patterns: &[String]) -> Result<()> {
    const MAX_PATTERNS: usize = 100;
    const MAX_PATTERN_LENGTH: usize = 255;

    if patterns.len() > MAX_PATTERNS {
        bail!(
            "Too many exclusion patterns: {} (max: {})",
            patterns.len(),
            MAX_PATTERNS
        );
    }

    for pattern in patterns {
        let trimmed = pattern.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.len() > MAX_PATTERN_LENGTH {
            bail!(
                "Pattern too long: '{}...' ({} bytes, max: {})",
                trimmed.chars().take(20).collect::<String>(),
                trimmed.len(),
                MAX_PATTERN_LENGTH
            );
        }

        if trimmed.contains("..") {
            bail!("Pattern contains path traversal: '{}'", trimmed);
        }

        if trimmed.contains('\0') || trimmed.contains('\n') || trimmed.contains('\r') {
            bail!("Pattern contains control characters");
        }

        globset::Glob::new(trimmed).map_err(|e| {
            anyhow::anyhow!("Invalid glob pattern '{}': {}", trimmed, e)
        })?;
    }

    Ok(())
}

/// Validate the base URL of the file-storage API.
pub fn validate_server_url(url: &str) -> Result<()> {
    const MAX_URL_LENGTH: usize = 2048;

    let trimmed = url.trim();

    if trimmed.is_empty() {
        bail!("Server URL cannot be empty");
    }

    if trimmed.len() > MAX_URL_LENGTH {
        bail!("Server URL too long: {} chars (max: {})", trimmed.len(), MAX_URL_LENGTH);
    }

    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        bail!("Server URL must start with http:// or https://: '{}'", trimmed);
    }

    if trimmed.chars().any(char::is_whitespace) {
        bail!("Server URL contains whitespace");
    }

    Ok(())
}

/// Validate a login name before it is sent to the server.
pub fn validate_username(username: &str) -> Result<()> {
    const MAX_USERNAME_LENGTH: usize = 50;

    if username.is_empty() {
        bail!("Username cannot be empty");
    }

    if username.len() > MAX_USERNAME_LENGTH {
        bail!(
            "Username too long: {} chars (max: {})",
            username.len(),
            MAX_USERNAME_LENGTH
        );
    }

    if username.chars().any(|c| c.is_control() || c.is_whitespace()) {
        bail!("Username contains whitespace or control characters");
    }

    Ok(())
}
