//! Upstream data layer for the Swarmdash relay (`InfluxDB` 2.x).
//!
//! The training swarm writes its metrics to an `InfluxDB` bucket:
//! miners report per-step training loss (`training_metrics`),
//! validators report all-reduce outcomes (`allreduce_operations`), and
//! the evaluation pipeline reports global model loss
//! (`evaluation_metrics`). This crate turns those measurements into
//! one [`DashboardDoc`](swarmdash_types::DashboardDoc) per poll.
//!
//! # Architecture
//!
//! ```text
//! DashboardCollector::collect
//!     |
//!     +-- flux::*          (query construction)
//!     +-- InfluxClient     (POST /api/v2/query, annotated CSV back)
//!     +-- csv::decode      (annotated CSV -> string records)
//!     +-- series assembly  (records -> DashboardDoc)
//! ```
//!
//! [`DashboardCollector`] implements the core's
//! [`SnapshotSource`](swarmdash_core::SnapshotSource) seam, so the
//! refresh loop is oblivious to everything above.
//!
//! # Modules
//!
//! - [`client`] -- HTTP client for the `InfluxDB` 2.x query API
//! - [`collector`] -- Document assembly and the source implementation
//! - [`csv`] -- Annotated-CSV response decoding
//! - [`error`] -- Shared error types
//! - [`flux`] -- Flux query construction

pub mod client;
pub mod collector;
pub mod csv;
pub mod error;
pub mod flux;

// Re-export primary types for convenience.
pub use client::{InfluxClient, InfluxConfig};
pub use collector::{CollectorConfig, DashboardCollector};
pub use csv::Record;
pub use error::InfluxError;
