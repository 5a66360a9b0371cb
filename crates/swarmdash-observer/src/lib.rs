//! Observer API server for the Swarmdash relay.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/dashboard`) that replays the cached
//!   snapshot on connect and forwards every adopted snapshot as a
//!   single text frame
//! - **REST endpoints** for the cached document (`/api/dashboard`) and
//!   relay health (`/api/status`)
//! - **Minimal HTML status page** (`GET /`) showing the current
//!   version, subscriber count, and endpoint links
//!
//! # Architecture
//!
//! The server holds an `Arc` of the core
//! [`SnapshotHub`](swarmdash_core::SnapshotHub) that the refresh loop
//! writes. Every send — replay, broadcast forwarding, the REST
//! document endpoint — transmits the snapshot's pre-serialized form
//! byte-for-byte; nothing on the request path re-serializes the
//! document or blocks the refresh loop.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_observer;
pub use state::AppState;
