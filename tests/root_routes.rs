use axum::http::StatusCode;
use tower::ServiceExt; // for `oneshot` and `ready`

use crate::helper::build_get_request;
use smartdiet_push_relay::{
    app::build_app,
    handlers::{global_404::ErrorResponse, health::HealthResponse},
};

mod helper;

#[tokio::test]
async fn test_health_route() {
    let app = build_app();
    let res = app.oneshot(build_get_request("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, "running");
    assert_eq!(health.message, "Push notification relay active");
    assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
    assert!(health.timestamp.ends_with('Z'));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = build_app();
    let res = app
        .oneshot(build_get_request("/a-not-existing-path"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
    let res_404: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(!res_404.success);
    assert_eq!(res_404.message, "Route `GET /a-not-existing-path` does not exist");
}
