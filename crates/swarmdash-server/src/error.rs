//! Error types for the relay binary.
//!
//! [`RelayError`] is the top-level error type that wraps all possible
//! failure modes during startup. Once the refresh loop is running
//! there are no fatal errors left: fetch failures are absorbed by the
//! loop and connection failures stay connection-local.

/// Top-level error for the relay binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The dashboard collector could not be constructed.
    #[error("collector error: {message}")]
    Collector {
        /// Description of the collector failure.
        message: String,
    },

    /// Observer API server failed to start.
    #[error("observer error: {message}")]
    Observer {
        /// Description of the observer failure.
        message: String,
    },
}
