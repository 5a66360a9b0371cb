//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use swarmdash_core::{Snapshot, SnapshotHub};
use swarmdash_observer::router::build_router;
use swarmdash_observer::state::AppState;
use swarmdash_types::{DashboardDoc, LossCurve, MinerSeries, PeerSeries, ValidatorSeries};
use tower::ServiceExt;

fn make_doc() -> DashboardDoc {
    let mut doc = DashboardDoc {
        run_id: String::from("6"),
        active_miners: 21,
        model_size: String::from("1.1B"),
        global_loss: LossCurve {
            outer_steps: vec![0, 40],
            losses: vec![3.2, 2.8],
        },
        ..DashboardDoc::default()
    };
    doc.miners.insert(
        String::from("12"),
        MinerSeries {
            epoch: vec![40, 41],
            loss: vec![2.46, 2.41],
        },
    );
    doc.validators.insert(
        String::from("25"),
        ValidatorSeries {
            peers: PeerSeries {
                epoch: vec![40, 41],
                count: vec![10, 11],
            },
            ..ValidatorSeries::default()
        },
    );
    doc
}

/// State with one snapshot adopted, plus the exact serialized form the
/// endpoints must echo.
async fn make_test_state() -> (Arc<AppState>, String) {
    let hub = Arc::new(SnapshotHub::new());
    let _ = hub.adopt(Snapshot::new(make_doc()).unwrap()).await;
    let serialized = hub.cached().await.unwrap().serialized().to_owned();
    (Arc::new(AppState::new(hub)), serialized)
}

/// State with an empty cache, as before the first successful fetch.
fn make_empty_state() -> Arc<AppState> {
    Arc::new(AppState::new(Arc::new(SnapshotHub::new())))
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let (state, _) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));

    let html = body_to_string(response.into_body()).await;
    assert!(html.contains("Swarmdash Relay"));
}

#[tokio::test]
async fn test_index_renders_before_first_fetch() {
    let router = build_router(make_empty_state());

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_dashboard_echoes_cached_serialized_form() {
    let (state, serialized) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("application/json"));

    // Byte-for-byte the cached serialized form, no transformation.
    let body = body_to_string(response.into_body()).await;
    assert_eq!(body, serialized);
}

#[tokio::test]
async fn test_get_dashboard_unavailable_before_first_fetch() {
    let router = build_router(make_empty_state());

    let response = router
        .oneshot(Request::get("/api/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 503);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_status_with_data() {
    let (state, _) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["has_data"], true);
    assert_eq!(json["version"], 41);
    assert_eq!(json["run_id"], "6");
    assert_eq!(json["subscribers"], 0);
    assert!(json["fetched_at"].is_string());
}

#[tokio::test]
async fn test_status_before_first_fetch() {
    let router = build_router(make_empty_state());

    let response = router
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["has_data"], false);
    assert_eq!(json["version"], Value::Null);
    assert_eq!(json["fetched_at"], Value::Null);
}

#[tokio::test]
async fn test_status_counts_subscribers() {
    let (state, _) = make_test_state().await;
    let _rx = state.hub.subscribe();
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["subscribers"], 1);
}

#[tokio::test]
async fn test_adoption_reaches_subscriber_and_rest_consistently() {
    let (state, _) = make_test_state().await;
    let mut rx = state.hub.subscribe();

    let mut doc = make_doc();
    doc.miners.insert(
        String::from("12"),
        MinerSeries {
            epoch: vec![40, 41, 42],
            loss: vec![2.46, 2.41, 2.37],
        },
    );
    let _ = state.hub.adopt(Snapshot::new(doc).unwrap()).await;

    // The broadcast message and the REST endpoint agree byte-for-byte.
    let broadcast = rx.recv().await.unwrap();
    let router = build_router(Arc::clone(&state));
    let response = router
        .oneshot(Request::get("/api/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_to_string(response.into_body()).await;
    assert_eq!(body, broadcast.serialized());
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let (state, _) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
