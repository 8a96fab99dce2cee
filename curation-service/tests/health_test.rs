mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_reports_store_status() {
    let app = TestApp::new();

    let (status, body) = app.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "curation-service");
}

#[tokio::test]
async fn readiness_checks_store_and_model() {
    let app = TestApp::new();

    let (status, body) = app.request("GET", "/ready", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();
    let request = common::build_request("GET", "/health", None, None);

    let response = tower::ServiceExt::oneshot(app.router(), request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn metrics_endpoint_serves_text() {
    let app = TestApp::new();
    let request = common::build_request("GET", "/metrics", None, None);

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
}
