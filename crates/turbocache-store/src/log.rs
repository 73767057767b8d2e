//! Per-team append-only record logs
//!
//! Each (team, kind) pair maps to one newline-delimited file. Appends and
//! reads on the same file are serialized through an async mutex so a reader
//! never sees half a record and two appends never interleave.

use crate::error::{Result, StoreError};
use crate::layout::team_dir;
use crate::types::LogKind;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// The file operations an append needs besides writing bytes
trait LogFile: AsyncWrite + Unpin + Send {
    fn len(&self) -> impl Future<Output = io::Result<u64>> + Send;
    fn truncate(&self, len: u64) -> impl Future<Output = io::Result<()>> + Send;
    fn sync(&self) -> impl Future<Output = io::Result<()>> + Send;
}

impl LogFile for File {
    fn len(&self) -> impl Future<Output = io::Result<u64>> + Send {
        async move { Ok(self.metadata().await?.len()) }
    }

    fn truncate(&self, len: u64) -> impl Future<Output = io::Result<()>> + Send {
        self.set_len(len)
    }

    fn sync(&self) -> impl Future<Output = io::Result<()>> + Send {
        self.sync_data()
    }
}

/// Write one line at the end of `file`. If any step fails the file is cut
/// back to its previous length so no partial record survives.
async fn append_line<F: LogFile>(file: &mut F, line: &[u8]) -> io::Result<()> {
    let orig_len = file.len().await?;

    let result = async {
        file.write_all(line).await?;
        file.flush().await?;
        file.sync().await
    }
    .await;

    if let Err(e) = result {
        if let Err(truncate_err) = file.truncate(orig_len).await {
            warn!(error = %truncate_err, orig_len, "Failed to roll back partial log record");
        }
        return Err(e);
    }

    Ok(())
}

pub struct AppendLog {
    root: PathBuf,
    locks: RwLock<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AppendLog {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            locks: RwLock::new(HashMap::new()),
        }
    }

    fn log_path(&self, team: &str, kind: LogKind) -> Result<PathBuf> {
        Ok(team_dir(&self.root, team)?.join(kind.file_name()))
    }

    async fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(path) {
                return lock.clone();
            }
        }

        let mut locks = self.locks.write().await;
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Append one record followed by a newline terminator
    pub async fn append(&self, team: &str, kind: LogKind, record: &[u8]) -> Result<()> {
        if record.contains(&b'\n') {
            return Err(StoreError::InvalidRecord(
                "record must not contain a newline".to_string(),
            ));
        }

        let path = self.log_path(team, kind)?;
        let mut line = Vec::with_capacity(record.len() + 1);
        line.extend_from_slice(record);
        line.push(b'\n');

        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        append_line(&mut file, &line).await?;

        debug!(team, log = kind.file_name(), size = record.len(), "Appended record");
        Ok(())
    }

    /// Full log contents, oldest record first
    pub async fn read_all(&self, team: &str, kind: LogKind) -> Result<Vec<u8>> {
        let path = self.log_path(team, kind)?;

        let lock = self.lock_for(&path).await;
        let _guard = lock.lock().await;

        fs::read(&path)
            .await
            .map_err(|e| StoreError::from_io(e, format!("{} log for team {}", kind.file_name(), team)))
    }
}
