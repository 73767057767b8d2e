//! On-disk layout: `<root>/<team>/<hash>`, `<root>/<team>/_meta`, `<root>/<team>/_events`

use crate::error::{Result, StoreError};
use std::path::{Path, PathBuf};

/// Check that a value can be used as a single path segment
fn validate_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidKey(format!("{} must not be empty", kind)));
    }

    if value.contains(['/', '\\', '\0']) {
        return Err(StoreError::InvalidKey(format!(
            "{} must not contain path separators: {:?}",
            kind, value
        )));
    }

    if value == "." || value == ".." {
        return Err(StoreError::InvalidKey(format!(
            "{} must not be a relative path: {:?}",
            kind, value
        )));
    }

    Ok(())
}

/// Hashes share the team directory with in-flight uploads (leading `.`) and
/// the logs (leading `_`), so those prefixes are reserved.
fn validate_hash(hash: &str) -> Result<()> {
    validate_segment("hash", hash)?;

    if hash.starts_with('.') || hash.starts_with('_') {
        return Err(StoreError::InvalidKey(format!(
            "hash must not start with '.' or '_': {:?}",
            hash
        )));
    }

    Ok(())
}

pub fn team_dir(root: &Path, team: &str) -> Result<PathBuf> {
    validate_segment("team", team)?;
    Ok(root.join(team))
}

pub fn artifact_path(root: &Path, team: &str, hash: &str) -> Result<PathBuf> {
    validate_hash(hash)?;
    Ok(team_dir(root, team)?.join(hash))
}
