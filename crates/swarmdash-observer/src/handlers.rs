//! REST API endpoint handlers for the Observer server.
//!
//! All handlers read the shared [`SnapshotHub`](swarmdash_core::SnapshotHub)
//! through [`AppState`]; none of them can block the refresh loop.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/dashboard` | The cached document, byte-for-byte |
//! | `GET` | `/api/status` | Relay health and version info |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing relay status and API links.
///
/// The real dashboard is a separate frontend; this page exists for
/// operators poking at the relay directly.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.hub.cached().await;
    let version = snapshot
        .as_ref()
        .and_then(|s| s.version())
        .map_or_else(|| String::from("—"), |v| v.to_string());
    let fetched_at = snapshot.as_ref().map_or_else(
        || String::from("never"),
        |s| s.fetched_at().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    let run_id = snapshot.as_ref().map_or_else(
        || String::from("—"),
        |s| s.payload().run_id.clone(),
    );
    let viewers = state.hub.subscriber_count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Swarmdash Relay</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Swarmdash Relay</h1>
    <p class="subtitle">Live training-metrics relay</p>

    <div>
        <div class="metric">
            <div class="label">Run</div>
            <div class="value">{run_id}</div>
        </div>
        <div class="metric">
            <div class="label">Epoch</div>
            <div class="value">{version}</div>
        </div>
        <div class="metric">
            <div class="label">Viewers</div>
            <div class="value">{viewers}</div>
        </div>
        <div class="metric">
            <div class="label">Fetched</div>
            <div class="value">{fetched_at}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/dashboard">/api/dashboard</a> -- Current dashboard document</li>
        <li><a href="/api/status">/api/status</a> -- Relay health</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/dashboard</code> -- Live dashboard stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/dashboard -- the cached document
// ---------------------------------------------------------------------------

/// Return the cached dashboard document exactly as it is broadcast.
///
/// The body is the snapshot's pre-serialized form; nothing is
/// re-serialized on the request path. Returns `503` until the first
/// snapshot is adopted.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = state.hub.cached().await.ok_or(ObserverError::NoData)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        snapshot.serialized().to_owned(),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/status -- relay health
// ---------------------------------------------------------------------------

/// Return relay health: whether a snapshot is cached, its version and
/// fetch time, and the current subscriber count.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.hub.cached().await;

    Json(serde_json::json!({
        "has_data": snapshot.is_some(),
        "version": snapshot.as_ref().and_then(|s| s.version()),
        "run_id": snapshot.as_ref().map(|s| s.payload().run_id.clone()),
        "fetched_at": snapshot.as_ref().map(|s| s.fetched_at().to_rfc3339()),
        "subscribers": state.hub.subscriber_count(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}
