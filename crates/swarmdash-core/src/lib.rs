//! Refresh/cache/fan-out core for the Swarmdash relay.
//!
//! This crate owns the process-wide loop that keeps the dashboard
//! current: fetch a candidate document from the upstream store, decide
//! whether it represents real progress, atomically swap it into the
//! shared cache on a genuine change, and fan the pre-serialized
//! document out to every connected viewer.
//!
//! # Architecture
//!
//! ```text
//! SnapshotSource::fetch --> change::decide --> SnapshotHub::adopt
//!                                                  |
//!                                    cache swap, then broadcast
//!                                                  |
//!                               one receiver per WebSocket client
//! ```
//!
//! The [`SnapshotHub`] is constructed once at process start and shared
//! by [`Arc`](std::sync::Arc) between the single refresh-loop task and
//! every connection handler. Within one refresh iteration the cache
//! replacement strictly precedes the broadcast, and broadcasts are
//! delivered in version order because the loop is serial.
//!
//! Fetch failures are fully absorbed by the loop: they are logged,
//! the cached snapshot stays current, and connection handlers never
//! observe them.
//!
//! # Modules
//!
//! - [`snapshot`] -- A versioned, serialize-once copy of the document
//! - [`change`] -- The adopt/keep decision policy
//! - [`hub`] -- Shared cache slot + broadcast fan-out
//! - [`source`] -- Upstream source trait and the scripted test stub
//! - [`refresh`] -- The periodic refresh loop

pub mod change;
pub mod hub;
pub mod refresh;
pub mod snapshot;
pub mod source;

// Re-export primary types for convenience.
pub use change::{Decision, decide};
pub use hub::SnapshotHub;
pub use refresh::{RefreshConfig, RefreshOutcome, refresh_once, run_refresh_loop};
pub use snapshot::Snapshot;
pub use source::{FetchError, ScriptedSource, SnapshotSource};
