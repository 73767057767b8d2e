//! Team-scoped blob storage

use crate::error::{Result, StoreError};
use crate::layout::{artifact_path, team_dir};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Stores artifact bytes under `<root>/<team>/<hash>`
pub struct BlobStore {
    root: PathBuf,
    /// Suffix counter for in-flight upload files
    next_upload: AtomicU64,
}

impl BlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            next_upload: AtomicU64::new(0),
        }
    }

    /// Store a blob, replacing any previous content for the same key.
    ///
    /// The bytes go to a temporary file first and are renamed into place, so a
    /// concurrent `get` sees either the old or the new blob in full.
    pub async fn put(&self, team: &str, hash: &str, data: &[u8]) -> Result<()> {
        let path = artifact_path(&self.root, team, hash)?;
        let dir = team_dir(&self.root, team)?;
        fs::create_dir_all(&dir).await?;

        let upload = self.next_upload.fetch_add(1, Ordering::Relaxed);
        let tmp_path = dir.join(format!(".{}.{}.{}.tmp", hash, std::process::id(), upload));

        if let Err(e) = write_file(&tmp_path, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            warn!(team, hash, error = %e, "Failed to move uploaded artifact into place");
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(team, hash, size = data.len(), "Stored artifact");
        Ok(())
    }

    pub async fn get(&self, team: &str, hash: &str) -> Result<Vec<u8>> {
        let path = artifact_path(&self.root, team, hash)?;

        fs::read(&path)
            .await
            .map_err(|e| StoreError::from_io(e, format!("artifact {}/{}", team, hash)))
    }

    /// Existence check without reading the body
    pub async fn exists(&self, team: &str, hash: &str) -> Result<bool> {
        let path = artifact_path(&self.root, team, hash)?;

        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_file(path: &std::path::Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path().to_path_buf());

        blobs.put("team-a", "abc123", b"artifact bytes").await.unwrap();

        let data = blobs.get("team-a", "abc123").await.unwrap();
        assert_eq!(data, b"artifact bytes");
        assert!(dir.path().join("team-a").join("abc123").is_file());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path().to_path_buf());

        let err = blobs.get("team-a", "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path().to_path_buf());

        blobs.put("team-a", "abc", b"first version").await.unwrap();
        blobs.put("team-a", "abc", b"second").await.unwrap();

        assert_eq!(blobs.get("team-a", "abc").await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path().to_path_buf());

        blobs.put("team-a", "abc", b"data").await.unwrap();
        blobs.put("team-a", "abc", b"data again").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("team-a"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path().to_path_buf());

        assert!(!blobs.exists("team-a", "abc").await.unwrap());
        blobs.put("team-a", "abc", b"").await.unwrap();
        assert!(blobs.exists("team-a", "abc").await.unwrap());
        assert!(!blobs.exists("team-b", "abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_invalid_keys() {
        let dir = tempdir().unwrap();
        let blobs = BlobStore::new(dir.path().to_path_buf());

        let err = blobs.put("team-a", "../escape", b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));

        let err = blobs.get("team-a", "_meta").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }
}
