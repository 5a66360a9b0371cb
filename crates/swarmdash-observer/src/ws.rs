//! `WebSocket` handler for live dashboard streaming.
//!
//! Viewers connect to `GET /ws/dashboard` and receive the full
//! dashboard document as one text frame per adopted snapshot. On
//! connect the cached snapshot is replayed immediately — a late joiner
//! never waits for the next refresh cycle — or, when no fetch has
//! succeeded yet, an explicit `{"status":"loading"}` marker is sent.
//!
//! Each connection holds its own broadcast receiver, so a dead or slow
//! viewer affects nobody else: a failed send ends only this
//! connection's task, and a viewer that falls behind skips to the most
//! recent snapshot.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::debug;
use uuid::Uuid;

use crate::state::AppState;

/// Sent to a viewer that connects before the first successful fetch.
const LOADING_MESSAGE: &str = r#"{"status":"loading"}"#;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming dashboard snapshots.
///
/// # Route
///
/// `GET /ws/dashboard`
pub async fn ws_dashboard(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: replay the cached snapshot, then
/// forward every adopted snapshot until the connection closes.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let viewer_id = Uuid::new_v4();
    debug!(%viewer_id, "viewer connected");

    // Subscribe before replaying so an adoption that lands between the
    // cache read and the first recv is not missed.
    let mut rx = state.hub.subscribe();

    let replay = match state.hub.cached().await {
        Some(snapshot) => snapshot.serialized().to_owned(),
        None => LOADING_MESSAGE.to_owned(),
    };
    if socket.send(Message::Text(replay.into())).await.is_err() {
        debug!(%viewer_id, "viewer disconnected before replay");
        return;
    }

    loop {
        tokio::select! {
            // A snapshot was adopted by the refresh loop.
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        let msg = Message::Text(snapshot.serialized().to_owned().into());
                        if socket.send(msg).await.is_err() {
                            debug!(%viewer_id, "viewer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!(%viewer_id, skipped = n, "viewer lagged, skipping to newest snapshot");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!(%viewer_id, "broadcast channel closed, shutting down connection");
                        return;
                    }
                }
            }
            // Check if the viewer sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%viewer_id, "viewer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let pong = Message::Pong(data);
                        if socket.send(pong).await.is_err() {
                            debug!(%viewer_id, "viewer disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%viewer_id, error = %e, "WebSocket error");
                        return;
                    }
                    _ => {
                        // Ignore text and binary frames from viewers;
                        // the stream is one-directional.
                    }
                }
            }
        }
    }
}
