//! Cross-crate smoke test: a real `BroadcastState` driven through a real
//! `argus_server::router`, without binding a socket (`spec.md` §8).

use std::sync::Arc;

use argus_broadcast::BroadcastState;
use argus_config::Config;
use argus_server::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

fn test_router() -> axum::Router {
    let config = Config::default();
    let state = AppState {
        broadcast: Arc::new(BroadcastState::new(&config)),
        families: config.families,
    };
    argus_server::router(state, std::env::temp_dir())
}

#[tokio::test]
async fn health_reports_zero_clients_with_no_subscribers() {
    let app = test_router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["clients"], 0);
}

#[tokio::test]
async fn active_threads_reflects_state_manager() {
    let config = Config::default();
    let broadcast = Arc::new(BroadcastState::new(&config));
    broadcast.state_manager.start(
        argus_events::ThreadId(1),
        Some("worker-1".to_string()),
        argus_events::CarrierId::UNKNOWN,
        argus_events::Timestamp::now(),
    );
    let app = argus_server::router(
        AppState { broadcast, families: config.families },
        std::env::temp_dir(),
    );

    let response = app
        .oneshot(Request::builder().uri("/active-threads").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["threadId"], 1);
}

#[tokio::test]
async fn unknown_thread_dump_is_not_found() {
    let app = test_router();

    let response = app
        .oneshot(Request::builder().uri("/threads/404/dump").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
