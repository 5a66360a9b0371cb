//! Error types for the upstream data layer.
//!
//! All errors propagate via [`InfluxError`]; at the source-trait
//! boundary they are folded into the core's
//! [`FetchError`](swarmdash_core::FetchError) taxonomy so the refresh
//! loop can absorb them uniformly.

use swarmdash_core::FetchError;

/// Errors that can occur while querying the metrics store.
#[derive(Debug, thiserror::Error)]
pub enum InfluxError {
    /// The HTTP request failed (transport, TLS, timeout).
    #[error("InfluxDB request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The query API answered with a non-success status.
    #[error("InfluxDB returned {status}: {body}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, which usually carries the Flux error.
        body: String,
    },

    /// The annotated-CSV response could not be decoded.
    #[error("could not decode query response: {0}")]
    Decode(String),

    /// A query that must return data returned nothing.
    #[error("no {0} found in the query window")]
    NoData(String),
}

impl From<InfluxError> for FetchError {
    fn from(err: InfluxError) -> Self {
        match err {
            InfluxError::Decode(message) => Self::Malformed { message },
            other => Self::Upstream {
                message: other.to_string(),
            },
        }
    }
}
