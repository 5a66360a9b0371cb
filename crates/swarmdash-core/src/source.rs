//! Upstream snapshot source trait and test stub.
//!
//! The refresh loop does not care where documents come from: the
//! production implementation queries the metrics store, and tests
//! script a canned sequence of results. The [`SnapshotSource`] trait
//! is that seam. Only the single refresh-loop task calls
//! [`fetch`](SnapshotSource::fetch); the call may take seconds and
//! runs entirely off the connection handlers' path.

use std::collections::VecDeque;
use std::future::Future;

use swarmdash_types::DashboardDoc;

/// Errors a snapshot source can produce.
///
/// These are absorbed by the refresh loop — logged, the cached
/// snapshot kept current, the loop continued. They never reach a
/// connection handler.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The upstream query failed (transport, auth, or server error).
    #[error("upstream query failed: {message}")]
    Upstream {
        /// Description of the failure.
        message: String,
    },

    /// The upstream answered but the response could not be decoded
    /// into a dashboard document.
    #[error("upstream returned malformed data: {message}")]
    Malformed {
        /// Description of what failed to decode.
        message: String,
    },
}

/// A source of dashboard documents.
///
/// Implementations fetch whatever upstream state is current at call
/// time. The method must be safe to invoke repeatedly; the core only
/// ever calls it serially from the refresh loop, never concurrently
/// with itself.
pub trait SnapshotSource: Send {
    /// Fetch a fresh dashboard document.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the upstream query fails or its
    /// response cannot be decoded.
    fn fetch(&mut self) -> impl Future<Output = Result<DashboardDoc, FetchError>> + Send;
}

/// A scripted source that replays a queue of canned results.
///
/// Used in tests to drive the refresh loop through exact fetch
/// sequences (new version, repeat version, fetch failure) without an
/// upstream store. Once the script is exhausted every further fetch
/// fails.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<DashboardDoc, FetchError>>,
}

impl ScriptedSource {
    /// Create a source that yields the given results in order.
    pub fn new(script: Vec<Result<DashboardDoc, FetchError>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// Whether every scripted result has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl SnapshotSource for ScriptedSource {
    fn fetch(&mut self) -> impl Future<Output = Result<DashboardDoc, FetchError>> + Send {
        let next = self.script.pop_front();
        async move {
            match next {
                Some(result) => result,
                None => Err(FetchError::Upstream {
                    message: String::from("scripted source exhausted"),
                }),
            }
        }
    }
}
