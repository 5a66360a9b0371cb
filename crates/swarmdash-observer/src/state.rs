//! Shared application state for the Observer API server.
//!
//! [`AppState`] wraps the core [`SnapshotHub`] — the single object the
//! refresh loop writes and every connection reads — plus the little
//! bookkeeping the status endpoints report. Wrapped in
//! [`Arc`](std::sync::Arc) and injected via Axum's `State` extractor.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use swarmdash_core::SnapshotHub;

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The snapshot cache + fan-out hub shared with the refresh loop.
    pub hub: Arc<SnapshotHub>,
    /// When this server instance started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state around the shared hub.
    pub fn new(hub: Arc<SnapshotHub>) -> Self {
        Self {
            hub,
            started_at: Utc::now(),
        }
    }
}
