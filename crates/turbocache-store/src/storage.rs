//! Artifact storage entry point used by request handlers

use crate::blob::BlobStore;
use crate::error::Result;
use crate::log::AppendLog;
use crate::summary::{summarize, ComputeTimeAccounting};
use crate::types::{EventRecord, LogKind, MetaRecord, Report};
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// Blobs plus the meta and event logs, rooted at one directory.
///
/// Built once at startup and shared by reference across requests.
pub struct Storage {
    blobs: BlobStore,
    logs: AppendLog,
    accounting: ComputeTimeAccounting,
}

impl Storage {
    /// Open (creating if needed) the storage root
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!(root = ?root, "Artifact storage initialized");

        Ok(Self {
            blobs: BlobStore::new(root.clone()),
            logs: AppendLog::new(root),
            accounting: ComputeTimeAccounting::default(),
        })
    }

    pub fn with_accounting(mut self, accounting: ComputeTimeAccounting) -> Self {
        self.accounting = accounting;
        self
    }

    /// Store an artifact and record its metadata.
    ///
    /// The blob is written before the metadata; if the append fails the blob
    /// stays in place without a meta record.
    pub async fn store_artifact(
        &self,
        team: &str,
        hash: &str,
        content: &[u8],
        content_length: &str,
        duration: &str,
    ) -> Result<()> {
        self.blobs.put(team, hash, content).await?;

        let meta = MetaRecord {
            hash: hash.to_string(),
            content_length: content_length.to_string(),
            duration: duration.to_string(),
        };
        let line = serde_json::to_vec(&meta)?;

        if let Err(e) = self.logs.append(team, LogKind::Meta, &line).await {
            warn!(team, hash, error = %e, "Stored artifact but failed to record metadata");
            return Err(e);
        }

        Ok(())
    }

    pub async fn fetch_artifact(&self, team: &str, hash: &str) -> Result<Vec<u8>> {
        self.blobs.get(team, hash).await
    }

    pub async fn artifact_exists(&self, team: &str, hash: &str) -> Result<bool> {
        self.blobs.exists(team, hash).await
    }

    /// Append one batch of usage events as a single event-log line
    pub async fn record_events(&self, team: &str, events: &[EventRecord]) -> Result<()> {
        let line = serde_json::to_vec(events)?;
        self.logs.append(team, LogKind::Events, &line).await
    }

    /// Savings report for a team. Never fails; unreadable or undecodable logs
    /// produce a report flagged as corrupted.
    pub async fn summary(&self, team: &str) -> Report {
        let meta = match self.logs.read_all(team, LogKind::Meta).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(team, error = %e, "Cannot read meta log");
                return Report::corrupted();
            }
        };

        let events = match self.logs.read_all(team, LogKind::Events).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(team, error = %e, "Cannot read event log");
                return Report::corrupted();
            }
        };

        summarize(&meta, &events, self.accounting)
    }
}
