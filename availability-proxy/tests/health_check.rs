mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["service"], "availability-proxy");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get("/ready").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-frame-options"], "DENY");
}
