//! REST APIハンドラー

pub mod auth;
pub mod error;
pub mod incidents;
pub mod reports;
pub mod system;

use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// アプリケーションのルーターを構築する
pub fn create_app(state: AppState) -> Router {
    let jwt_secret = state.jwt_secret.clone();
    let body_limit = state.config.max_request_bytes;

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/incidents/:id", get(incidents::get_incident))
        .route(
            "/incidents/:id/evidence",
            get(incidents::get_incident_evidence),
        )
        .layer(middleware::from_fn_with_state(
            jwt_secret,
            crate::auth::middleware::jwt_auth_middleware,
        ));

    let public = Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/report", post(incidents::submit_report))
        .route("/incidents/report", post(incidents::submit_report))
        .route("/reports", post(reports::create_report));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
