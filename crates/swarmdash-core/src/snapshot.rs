//! A versioned, serialize-once copy of the dashboard document.
//!
//! Every viewer-facing send — replay on connect, broadcast on adoption,
//! the REST document endpoint — transmits [`Snapshot::serialized`]
//! byte-for-byte. The document is serialized exactly once, when the
//! snapshot is constructed; fields are private so no caller can make
//! the serialized form diverge from the payload it was derived from.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use swarmdash_types::DashboardDoc;

/// One complete, versioned copy of the data the relay serves.
#[derive(Debug, Clone)]
pub struct Snapshot {
    payload: DashboardDoc,
    version: Option<u64>,
    serialized: Arc<str>,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from a freshly fetched document.
    ///
    /// Serializes the payload once and captures its
    /// [`latest_epoch`](DashboardDoc::latest_epoch) as the version.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the document
    /// cannot be serialized.
    pub fn new(payload: DashboardDoc) -> Result<Self, serde_json::Error> {
        let serialized: Arc<str> = serde_json::to_string(&payload)?.into();
        let version = payload.latest_epoch();
        Ok(Self {
            payload,
            version,
            serialized,
            fetched_at: Utc::now(),
        })
    }

    /// The maximum epoch across all series in the payload, if any
    /// series carried one.
    pub const fn version(&self) -> Option<u64> {
        self.version
    }

    /// The document this snapshot was built from.
    pub const fn payload(&self) -> &DashboardDoc {
        &self.payload
    }

    /// The pre-serialized JSON form of the payload.
    pub fn serialized(&self) -> &str {
        &self.serialized
    }

    /// When the upstream fetch that produced this snapshot completed.
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}
