//! Team-scoped artifact store for a remote build cache
//!
//! Stores content-addressed artifacts per team, keeps append-only logs of
//! artifact metadata and client usage events, and summarizes those logs into
//! a cache savings report.

mod blob;
mod error;
mod layout;
mod log;
mod storage;
mod summary;
mod types;

pub use blob::BlobStore;
pub use error::{Result, StoreError};
pub use log::AppendLog;
pub use storage::Storage;
pub use summary::{summarize, ComputeTimeAccounting};
pub use types::{EventRecord, LogKind, MetaRecord, Report};
