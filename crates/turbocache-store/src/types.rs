//! Record and report types

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` as the field's zero value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Metadata written once per stored artifact.
///
/// `content_length` and `duration` keep the caller's original strings; they are
/// only interpreted as integers during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(rename = "content-length", deserialize_with = "null_as_default")]
    pub content_length: String,
    #[serde(deserialize_with = "null_as_default")]
    pub duration: String,
}

/// A client-reported cache usage event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    #[serde(rename = "sessionId", deserialize_with = "null_as_default")]
    pub session_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hash: String,
    /// Milliseconds
    #[serde(deserialize_with = "null_as_default")]
    pub duration: i64,
}

impl EventRecord {
    /// True when the lookup went against this remote cache
    pub fn is_remote(&self) -> bool {
        self.source == "REMOTE"
    }

    /// True for a cache hit; every other value counts as a miss
    pub fn is_hit(&self) -> bool {
        self.event == "HIT"
    }
}

/// Cache-effectiveness summary for one team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub corrupted_data: bool,
    pub saved_time: String,
    pub total_compute_time: String,
    pub content_length: String,
}

impl Report {
    /// Report returned when the logs cannot be read or decoded
    pub fn corrupted() -> Self {
        Self {
            corrupted_data: true,
            ..Self::default()
        }
    }
}

/// The two per-team logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Meta,
    Events,
}

impl LogKind {
    pub fn file_name(self) -> &'static str {
        match self {
            LogKind::Meta => "_meta",
            LogKind::Events => "_events",
        }
    }
}
