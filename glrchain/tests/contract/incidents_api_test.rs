//! Contract Test: POST /report, GET /incidents/:id, GET /incidents/:id/evidence

use crate::support::{
    body_json, build_app, get_request, register_and_login, MultipartBody, TestApp, TestAppBuilder,
    EMPTY_BUNDLE_HASH, HELLO_BUNDLE_CANONICAL, HELLO_BUNDLE_HASH,
};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use glrchain::api::error::AppError;
use glrchain::evidence::{sha256_hex, EvidenceSource, IncidentMetadata, MissingEvidencePolicy};

fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[tokio::test]
async fn report_packages_reference_example() {
    let app = build_app().await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["evidence_hash"], HELLO_BUNDLE_HASH);
    assert!(is_hex(body["incident_id"].as_str().unwrap(), 32));

    let pkg = std::path::PathBuf::from(body["pkg"].as_str().unwrap());
    assert_eq!(
        pkg,
        app.evidence_path()
            .join(format!("evidence_{}.json", HELLO_BUNDLE_HASH))
    );
    assert_eq!(std::fs::read_to_string(&pkg).unwrap(), HELLO_BUNDLE_CANONICAL);
    assert_eq!(sha256_hex(&std::fs::read(&pkg).unwrap()), HELLO_BUNDLE_HASH);
}

#[tokio::test]
async fn spool_is_empty_after_successful_report() {
    let app = build_app().await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "one.jpg", &[0xff, 0xd8, 0xff, 0xe0])
                .file("files", "two.jpg", &[0xff, 0xd8, 0x00])
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.spool_entries(), 0);
}

#[tokio::test]
async fn both_routes_are_deterministic() {
    let app = build_app().await;

    let first = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", None),
        )
        .await;
    let second = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/incidents/report", None),
        )
        .await;

    let first = body_json(first).await;
    let second = body_json(second).await;
    assert_eq!(first["evidence_hash"], second["evidence_hash"]);
    assert_eq!(first["pkg"], second["pkg"]);
    assert_ne!(first["incident_id"], second["incident_id"]);
    assert_eq!(std::fs::read_dir(app.evidence_path()).unwrap().count(), 1);
}

#[tokio::test]
async fn file_order_changes_evidence_hash() {
    let app = build_app().await;

    let forward = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "x.bin", b"first")
                .file("files", "y.bin", b"second")
                .into_request("/report", None),
        )
        .await;
    let reversed = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "y.bin", b"second")
                .file("files", "x.bin", b"first")
                .into_request("/report", None),
        )
        .await;

    assert_ne!(
        body_json(forward).await["evidence_hash"],
        body_json(reversed).await["evidence_hash"]
    );
}

#[tokio::test]
async fn report_without_files_is_accepted() {
    let app = build_app().await;

    let response = app
        .send(MultipartBody::reference_meta().into_request("/report", None))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["evidence_hash"], EMPTY_BUNDLE_HASH);
}

#[tokio::test]
async fn empty_file_selection_is_ignored() {
    let app = build_app().await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "", b"")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["evidence_hash"], EMPTY_BUNDLE_HASH);
}

#[tokio::test]
async fn client_path_components_are_stripped() {
    let app = build_app().await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "../../a.txt", b"hello")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["evidence_hash"], HELLO_BUNDLE_HASH);
}

#[tokio::test]
async fn missing_title_is_rejected_and_spool_cleaned() {
    let app = build_app().await;

    let response = app
        .send(
            MultipartBody::new()
                .file("files", "a.txt", b"hello")
                .text("description", "D")
                .text("lat", "1")
                .text("lon", "2")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "title is required");
    assert_eq!(app.spool_entries(), 0);
    assert_eq!(std::fs::read_dir(app.evidence_path()).unwrap().count(), 0);
}

#[tokio::test]
async fn out_of_range_coordinates_are_rejected() {
    let app = build_app().await;

    let response = app
        .send(
            MultipartBody::new()
                .text("title", "T")
                .text("description", "D")
                .text("lat", "123.4")
                .text("lon", "2")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_file_is_413_and_spool_cleaned() {
    let app = TestAppBuilder::default().max_file_bytes(8).build().await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "big.bin", &[7u8; 64])
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.spool_entries(), 0);
}

#[tokio::test]
async fn storage_failure_is_503_and_spool_cleaned() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let app = TestAppBuilder::default()
        .evidence_dir(blocker.path().join("evidence"))
        .build()
        .await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "service_unavailable");
    assert_eq!(app.spool_entries(), 0);
}

#[tokio::test]
async fn fail_policy_still_accepts_uploaded_files() {
    let app = TestAppBuilder::default()
        .policy(MissingEvidencePolicy::Fail)
        .build()
        .await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", None),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["evidence_hash"], HELLO_BUNDLE_HASH);
}

#[tokio::test]
async fn fail_policy_turns_missing_evidence_into_400() {
    let app = TestAppBuilder::default()
        .policy(MissingEvidencePolicy::Fail)
        .build()
        .await;
    let inputs = tempfile::TempDir::new().unwrap();
    let meta = IncidentMetadata {
        title: "T".into(),
        description: "D".into(),
        lat: 1.0,
        lon: 2.0,
        auto: false,
    };

    let err = app
        .state
        .packager
        .package(&meta, &[EvidenceSource::from_path(inputs.path().join("gone.jpg"))])
        .await
        .unwrap_err();
    let response = AppError::from(err).into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(body["error"]["message"], "Evidence file not found");
    assert_eq!(std::fs::read_dir(app.evidence_path()).unwrap().count(), 0);
}

async fn submit_hello(app: &TestApp, token: Option<&str>) -> String {
    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["incident_id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn status_of(app: &TestApp, uri: &str, token: &str) -> StatusCode {
    app.send(get_request(uri, Some(token))).await.status()
}

#[tokio::test]
async fn reporter_reads_own_incident_but_not_others() {
    let app = build_app().await;
    let admin = register_and_login(&app, "warden", "riverwatch-2024").await;
    let alice = register_and_login(&app, "alice", "riverwatch-2024").await;
    let bob = register_and_login(&app, "bob", "riverwatch-2024").await;

    let own = format!("/incidents/{}", submit_hello(&app, Some(&alice)).await);
    let own_evidence = format!("{}/evidence", own);
    let anonymous = format!("/incidents/{}", submit_hello(&app, None).await);

    assert_eq!(status_of(&app, &own, &alice).await, StatusCode::OK);
    assert_eq!(status_of(&app, &own_evidence, &alice).await, StatusCode::OK);
    assert_eq!(status_of(&app, &own, &bob).await, StatusCode::FORBIDDEN);
    assert_eq!(status_of(&app, &own_evidence, &bob).await, StatusCode::FORBIDDEN);
    assert_eq!(status_of(&app, &anonymous, &alice).await, StatusCode::FORBIDDEN);
    assert_eq!(status_of(&app, &own, &admin).await, StatusCode::OK);
    assert_eq!(status_of(&app, &anonymous, &admin).await, StatusCode::OK);

    let body = body_json(app.send(get_request(&own, Some(&bob))).await).await;
    assert_eq!(body["error"]["type"], "permission_error");
    assert_eq!(body["error"]["message"], "Access denied");
}

#[tokio::test]
async fn invalid_bearer_token_is_rejected() {
    let app = build_app().await;

    let response = app
        .send(MultipartBody::reference_meta().into_request("/report", Some("not-a-token")))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_report_is_attributed_and_readable() {
    let app = build_app().await;
    let token = register_and_login(&app, "ranger01", "riverwatch-2024").await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", Some(&token)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let incident_id = body_json(response).await["incident_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .send(get_request(&format!("/incidents/{}", incident_id), Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], incident_id.as_str());
    assert_eq!(body["description"], "D");
    assert_eq!(body["status"], "new");
    assert_eq!(body["file_count"], 1);
    assert_eq!(body["evidence_hash"], HELLO_BUNDLE_HASH);
    assert!(body["reporter_id"].is_string());
}

#[tokio::test]
async fn description_is_encrypted_at_rest() {
    let app = build_app().await;

    let response = app
        .send(MultipartBody::reference_meta().into_request("/report", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored: String = sqlx::query_scalar("SELECT description_enc FROM incidents")
        .fetch_one(&app.state.db_pool)
        .await
        .unwrap();
    assert_ne!(stored, "D");
    assert_eq!(app.state.cipher.decrypt_str(&stored).unwrap(), "D");
}

#[tokio::test]
async fn incident_lookup_requires_auth() {
    let app = build_app().await;

    let response = app
        .send(MultipartBody::reference_meta().into_request("/report", None))
        .await;
    let incident_id = body_json(response).await["incident_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .send(get_request(&format!("/incidents/{}", incident_id), None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_incident_is_404() {
    let app = build_app().await;
    let token = register_and_login(&app, "ranger02", "riverwatch-2024").await;

    let response = app
        .send(get_request(
            "/incidents/00000000000000000000000000000000",
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(get_request("/incidents/not-an-id", Some(&token)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn evidence_endpoint_returns_stored_bundle() {
    let app = build_app().await;
    let token = register_and_login(&app, "ranger03", "riverwatch-2024").await;

    let response = app
        .send(
            MultipartBody::reference_meta()
                .file("files", "a.txt", b"hello")
                .into_request("/report", None),
        )
        .await;
    let incident_id = body_json(response).await["incident_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .send(get_request(
            &format!("/incidents/{}/evidence", incident_id),
            Some(&token),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["title"], "T");
    assert_eq!(body["files"][0]["name"], "a.txt");
    assert_eq!(body["files"][0]["size"], 5);
}
