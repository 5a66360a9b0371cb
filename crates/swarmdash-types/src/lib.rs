//! Shared type definitions for the Swarmdash relay.
//!
//! This crate is the single source of truth for the dashboard document
//! that flows from the metrics store to connected viewers. The JSON
//! shape is part of the viewer contract and must not drift: frontends
//! deserialize these exact keys.
//!
//! # Modules
//!
//! - [`document`] -- The nested dashboard document and its series types

pub mod document;

// Re-export all public types at crate root for convenience.
pub use document::{
    DashboardDoc, LearningRateSeries, LossCurve, MinerSeries, PeerSeries, ValidatorSeries,
};
