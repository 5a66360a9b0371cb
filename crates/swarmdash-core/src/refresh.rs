//! The periodic refresh loop.
//!
//! One long-lived task drives fetch → decide → adopt → broadcast on a
//! fixed interval, forever. The loop has no terminal state: every
//! failure mode is absorbed here, logged, and followed by the next
//! cycle. Connection handlers never observe a fetch failure; viewers
//! simply keep seeing the last good snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::change::{self, Decision};
use crate::hub::SnapshotHub;
use crate::snapshot::Snapshot;
use crate::source::SnapshotSource;

/// Configuration for the refresh loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshConfig {
    /// Seconds to sleep between refresh cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Optional path the serialized payload is written to on every
    /// adoption, as a debugging / cold-start aid. The file is never
    /// read back by the relay.
    #[serde(default)]
    pub persist_path: Option<PathBuf>,
}

const fn default_interval_secs() -> u64 {
    30
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            persist_path: None,
        }
    }
}

/// What one refresh cycle did.
///
/// Tests assert on this instead of matching log strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A strictly newer snapshot replaced the cache and was broadcast.
    Adopted {
        /// The adopted snapshot's version.
        version: Option<u64>,
        /// How many subscribers the broadcast reached.
        receivers: usize,
    },
    /// The candidate was not newer than the cache; nothing changed.
    KeptUnchanged,
    /// No epoch could be extracted from the candidate; the previous
    /// version stays current.
    KeptNoVersion,
    /// The fetch itself failed; the cached snapshot stays current.
    FetchFailed,
}

/// Run one refresh cycle: fetch, decide, and on adoption swap the
/// cache and broadcast.
///
/// All failures are absorbed: a fetch or serialization failure logs
/// and returns [`RefreshOutcome::FetchFailed`] without touching the
/// cache.
pub async fn refresh_once<S: SnapshotSource>(
    hub: &SnapshotHub,
    source: &mut S,
    persist_path: Option<&Path>,
) -> RefreshOutcome {
    let doc = match source.fetch().await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "dashboard fetch failed, keeping cached snapshot");
            return RefreshOutcome::FetchFailed;
        }
    };

    let snapshot = match Snapshot::new(doc) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "snapshot serialization failed, keeping cached snapshot");
            return RefreshOutcome::FetchFailed;
        }
    };

    let candidate = snapshot.version();
    let (last, cache_empty) = {
        let cached = hub.cached().await;
        (cached.as_ref().and_then(|s| s.version()), cached.is_none())
    };

    match change::decide(candidate, last, cache_empty) {
        Decision::Adopt => {
            if let Some(path) = persist_path {
                persist_snapshot(path, snapshot.serialized()).await;
            }
            let receivers = hub.adopt(snapshot).await;
            info!(
                version = ?candidate,
                previous = ?last,
                receivers,
                "new snapshot adopted"
            );
            RefreshOutcome::Adopted {
                version: candidate,
                receivers,
            }
        }
        Decision::Keep if candidate.is_none() => {
            warn!(
                last_version = ?last,
                "no epoch extractable from candidate, keeping cached snapshot"
            );
            RefreshOutcome::KeptNoVersion
        }
        Decision::Keep => {
            debug!(
                candidate = ?candidate,
                last_version = ?last,
                "no new epoch, keeping cached snapshot"
            );
            RefreshOutcome::KeptUnchanged
        }
    }
}

/// Drive [`refresh_once`] forever on the configured interval.
///
/// This future never resolves; it is intended to be the main task of
/// the relay process (or spawned alongside the server). Shutdown is
/// process shutdown.
pub async fn run_refresh_loop<S: SnapshotSource>(
    hub: Arc<SnapshotHub>,
    mut source: S,
    config: RefreshConfig,
) {
    info!(
        interval_secs = config.interval_secs,
        persist = config.persist_path.is_some(),
        "refresh loop starting"
    );

    let mut cycle: u64 = 0;
    loop {
        cycle = cycle.saturating_add(1);
        let outcome = refresh_once(&hub, &mut source, config.persist_path.as_deref()).await;
        debug!(cycle, outcome = ?outcome, "refresh cycle complete");

        tokio::time::sleep(tokio::time::Duration::from_secs(config.interval_secs)).await;
    }
}

/// Write the serialized payload to the persist path, logging on
/// failure. The relay never reads this file back.
async fn persist_snapshot(path: &Path, serialized: &str) {
    if let Err(e) = tokio::fs::write(path, serialized).await {
        warn!(path = %path.display(), error = %e, "could not write snapshot file");
    }
}
