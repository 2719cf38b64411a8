//! Contract Test: POST /reports

use crate::support::{body_json, build_app, json_request};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn report_is_stored_with_encrypted_description() {
    let app = build_app().await;

    let response = app
        .send(json_request(
            "POST",
            "/reports",
            json!({
                "reporter": "Abena",
                "location": "Ankobra river, Western Region",
                "description": "Changfan machines dredging at night",
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Report received");

    let id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    let stored = glrchain::db::reports::find_description_enc(&app.state.db_pool, id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.contains("Changfan"));
    assert_eq!(
        app.state.cipher.decrypt_str(&stored).unwrap(),
        "Changfan machines dredging at night"
    );
}

#[tokio::test]
async fn blank_report_is_400() {
    let app = build_app().await;

    let response = app
        .send(json_request(
            "POST",
            "/reports",
            json!({ "reporter": "Abena", "location": "", "description": "x" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = build_app().await;

    let response = app
        .send(json_request("POST", "/reports", json!({ "reporter": "Abena" })))
        .await;
    assert!(response.status().is_client_error());
}
