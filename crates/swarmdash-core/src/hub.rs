//! Shared snapshot cache and broadcast fan-out.
//!
//! [`SnapshotHub`] replaces the module-level globals of a typical
//! single-file relay with one explicit object: a cache slot holding the
//! last adopted [`Snapshot`] and a broadcast channel fanning adoptions
//! out to every connected viewer. It is constructed once at process
//! start and shared by `Arc` between the refresh loop (the only
//! writer) and the connection handlers (readers and subscribers).
//!
//! A subscriber is registered for exactly as long as it holds its
//! [`broadcast::Receiver`]; dropping the receiver (the connection task
//! exiting, including on a send failure) removes it. A subscriber that
//! falls behind by more than the channel capacity skips to the most
//! recent snapshot.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::snapshot::Snapshot;

/// Capacity of the broadcast channel for adopted snapshots.
///
/// If a subscriber falls behind by more than this many messages it
/// receives a [`broadcast::error::RecvError::Lagged`] and resumes from
/// the newest snapshot. Adoptions are minutes apart in practice, so
/// lag only occurs for pathologically slow clients.
const BROADCAST_CAPACITY: usize = 256;

/// Process-wide cache slot plus subscriber fan-out.
#[derive(Debug)]
pub struct SnapshotHub {
    tx: broadcast::Sender<Arc<Snapshot>>,
    cache: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotHub {
    /// Create a hub with an empty cache and no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            cache: RwLock::new(None),
        }
    }

    /// Subscribe to adopted snapshots.
    ///
    /// The returned receiver yields every snapshot adopted after this
    /// call. It does not replay the current cache; connection handlers
    /// replay [`cached`](Self::cached) themselves so a late joiner
    /// never waits for the next refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    /// The last adopted snapshot, or `None` before the first
    /// successful fetch.
    pub async fn cached(&self) -> Option<Arc<Snapshot>> {
        self.cache.read().await.clone()
    }

    /// The version of the cached snapshot, if one is cached and it
    /// carried an extractable epoch.
    pub async fn version(&self) -> Option<u64> {
        self.cache.read().await.as_ref().and_then(|s| s.version())
    }

    /// Whether no snapshot has been adopted yet.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_none()
    }

    /// Adopt a snapshot: replace the cache slot, then broadcast.
    ///
    /// The cache replacement is a single reference swap and strictly
    /// precedes the broadcast, so no subscriber can observe a
    /// notification for data the cache does not yet reflect.
    ///
    /// Returns the number of subscribers the broadcast reached.
    /// Returns 0 when no viewer is connected; that is a successful
    /// no-op, not an error.
    pub async fn adopt(&self, snapshot: Snapshot) -> usize {
        let snapshot = Arc::new(snapshot);
        {
            let mut slot = self.cache.write().await;
            *slot = Some(Arc::clone(&snapshot));
        }
        // send returns Err only when there are zero receivers, which
        // is normal when no viewer is connected.
        self.tx.send(snapshot).unwrap_or(0)
    }

    /// Number of currently subscribed viewers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SnapshotHub {
    fn default() -> Self {
        Self::new()
    }
}
