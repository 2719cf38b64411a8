//! Shared helpers for HTTP contract tests

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use glrchain::config::AppConfig;
use glrchain::evidence::MissingEvidencePolicy;
use glrchain::{api, AppState};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "contract-test-jwt-secret";

/// `{title:"T", description:"D", lat:1, lon:2, auto:false}` + `hello` as `a.txt`
pub const HELLO_BUNDLE_HASH: &str =
    "76f1cdfaa7236ea6045ae56860f89889a73b39f7dfa067764175c26fe1f1d98a";

pub const HELLO_BUNDLE_CANONICAL: &str = r#"{"files":[{"name":"a.txt","sha256":"2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824","size":5}],"meta":{"auto":false,"description":"D","lat":1,"lon":2,"title":"T"}}"#;

/// Same metadata, no files
pub const EMPTY_BUNDLE_HASH: &str =
    "22b4c298c237e6b1c0a92d2fc9626f3d9482bba6bad2f350a5e0bb124d6ca7bd";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub evidence_dir: TempDir,
    pub spool_dir: TempDir,
}

impl TestApp {
    pub fn evidence_path(&self) -> &Path {
        self.evidence_dir.path()
    }

    /// Number of entries left in the upload spool
    pub fn spool_entries(&self) -> usize {
        std::fs::read_dir(self.spool_dir.path()).unwrap().count()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub struct TestAppBuilder {
    policy: MissingEvidencePolicy,
    max_file_bytes: u64,
    max_request_bytes: usize,
    evidence_override: Option<PathBuf>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            policy: MissingEvidencePolicy::Skip,
            max_file_bytes: 1024 * 1024,
            max_request_bytes: 8 * 1024 * 1024,
            evidence_override: None,
        }
    }
}

impl TestAppBuilder {
    pub fn policy(mut self, policy: MissingEvidencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn max_request_bytes(mut self, bytes: usize) -> Self {
        self.max_request_bytes = bytes;
        self
    }

    /// Point the evidence store somewhere else (e.g. an unwritable path)
    pub fn evidence_dir(mut self, dir: PathBuf) -> Self {
        self.evidence_override = Some(dir);
        self
    }

    pub async fn build(self) -> TestApp {
        let evidence_dir = TempDir::new().unwrap();
        let spool_dir = TempDir::new().unwrap();

        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            evidence_dir: self
                .evidence_override
                .unwrap_or_else(|| evidence_dir.path().to_path_buf()),
            spool_dir: spool_dir.path().to_path_buf(),
            encryption_key: std::array::from_fn(|i| i as u8),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            missing_evidence: self.policy,
            max_file_bytes: self.max_file_bytes,
            max_request_bytes: self.max_request_bytes,
            auto_migrate: true,
        };

        let db_pool = sqlx::SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .expect("Failed to run migrations");

        let state = AppState::new(config, db_pool);
        let app = api::create_app(state.clone());
        TestApp {
            app,
            state,
            evidence_dir,
            spool_dir,
        }
    }
}

pub async fn build_app() -> TestApp {
    TestAppBuilder::default().build().await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Hand-built multipart/form-data body
pub struct MultipartBody {
    boundary: String,
    buf: Vec<u8>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "glrchain-test-boundary-7d3f".to_string(),
            buf: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary, name, file_name
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(content);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// The `T`/`D`/`1`/`2`/`false` metadata used by the reference example
    pub fn reference_meta() -> Self {
        Self::new()
            .text("title", "T")
            .text("description", "D")
            .text("lat", "1")
            .text("lon", "2")
            .text("auto", "false")
    }

    pub fn into_request(mut self, uri: &str, bearer: Option<&str>) -> Request<Body> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", self.boundary),
            );
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(self.buf)).unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Register a user and return a bearer token for it
pub async fn register_and_login(app: &TestApp, username: &str, password: &str) -> String {
    let response = app
        .send(json_request(
            "POST",
            "/auth/register",
            json!({ "username": username, "password": password }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(json_request(
            "POST",
            "/auth/login",
            json!({ "username": username, "password": password }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
