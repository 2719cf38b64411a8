//! Contract Test: GET /, GET /health

use crate::support::{body_json, build_app, get_request};
use axum::http::StatusCode;

#[tokio::test]
async fn root_banner() {
    let app = build_app().await;

    let response = app.send(get_request("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["status"].as_str().unwrap().contains("GLRChain"));
    assert!(body["mission"].is_string());
}

#[tokio::test]
async fn health_reports_database_ok() {
    let app = build_app().await;

    let response = app.send(get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["database"], "ok");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn health_is_503_when_database_unreachable() {
    let app = build_app().await;
    app.state.db_pool.close().await;

    let response = app.send(get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "unhealthy");
}
