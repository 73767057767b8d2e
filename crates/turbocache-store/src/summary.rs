//! Reconciles the event log against the meta log into a savings report
//!
//! Meta log lines are single `MetaRecord` objects, event log lines are arrays
//! of `EventRecord` (one array per client upload). Both logs are decoded by
//! treating their lines as the elements of one JSON array.

use crate::types::{EventRecord, MetaRecord, Report};
use serde::de::DeserializeOwned;
use std::num::IntErrorKind;
use tracing::{debug, warn};

/// How a remote event's own duration feeds `total_compute_time`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComputeTimeAccounting {
    /// Added once for every meta record scanned while resolving the event.
    /// Matches reports produced by existing deployments.
    #[default]
    PerScannedRecord,
    /// Added exactly once per remote event
    PerEvent,
}

impl std::str::FromStr for ComputeTimeAccounting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "per-record" => Ok(ComputeTimeAccounting::PerScannedRecord),
            "per-event" => Ok(ComputeTimeAccounting::PerEvent),
            other => Err(format!(
                "unknown compute time accounting {:?}, expected per-record or per-event",
                other
            )),
        }
    }
}

/// Decode newline-separated JSON values as one sequence
fn decode_lines<T: DeserializeOwned>(raw: &[u8]) -> serde_json::Result<Vec<T>> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    let joined = trimmed.split('\n').collect::<Vec<_>>().join(",");
    serde_json::from_str(&format!("[{}]", joined))
}

/// Lenient integer parse: out-of-range values clamp to the i64 bounds,
/// anything else that is not a plain signed integer is 0
fn parse_int(value: &str) -> i64 {
    match value.parse::<i64>() {
        Ok(n) => n,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
    }
}

/// Build the report from raw log bytes
pub fn summarize(meta_raw: &[u8], events_raw: &[u8], accounting: ComputeTimeAccounting) -> Report {
    // A `null` line or element stands for a zero-valued record
    let metas: Vec<MetaRecord> = match decode_lines::<Option<MetaRecord>>(meta_raw) {
        Ok(metas) => metas.into_iter().map(Option::unwrap_or_default).collect(),
        Err(e) => {
            warn!(error = %e, "Failed to decode meta log");
            return Report::corrupted();
        }
    };

    let batches: Vec<Option<Vec<Option<EventRecord>>>> = match decode_lines(events_raw) {
        Ok(batches) => batches,
        Err(e) => {
            warn!(error = %e, "Failed to decode event log");
            return Report::corrupted();
        }
    };

    let content_length = metas
        .iter()
        .fold(0i64, |acc, m| acc.saturating_add(parse_int(&m.content_length)));

    let mut saved: i64 = 0;
    let mut compute: i64 = 0;
    let mut unresolved = 0usize;

    let remote = batches
        .iter()
        .flatten()
        .flatten()
        .flatten()
        .filter(|e| e.is_remote());

    for event in remote {
        match metas.iter().find(|m| m.hash == event.hash) {
            Some(meta) => {
                let duration = parse_int(&meta.duration);
                if event.is_hit() {
                    saved = saved.saturating_add(duration);
                } else {
                    compute = compute.saturating_add(duration);
                }
            }
            None => unresolved += 1,
        }

        // The full meta log is always scanned, so every record counts once.
        let repeats = match accounting {
            ComputeTimeAccounting::PerScannedRecord => metas.len() as i64,
            ComputeTimeAccounting::PerEvent => 1,
        };
        compute = compute.saturating_add(event.duration.saturating_mul(repeats));
    }

    if unresolved > 0 {
        debug!(unresolved, "Remote events without matching artifact metadata");
    }

    Report {
        corrupted_data: unresolved > 0,
        saved_time: format!("{} (ms)", saved),
        total_compute_time: format!("{} (ms)", compute),
        content_length: format!("{} (bytes)", content_length),
    }
}
