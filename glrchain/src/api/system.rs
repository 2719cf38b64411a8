//! サービス情報とヘルスチェック

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// GET / - サービスバナー
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "GLRChain backend running",
        "mission": "Protecting Ghana's land and rivers from illegal mining",
    }))
}

/// GET /health - DB疎通を含むヘルスチェック
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match crate::db::migrations::ping(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "database": "ok", "status": "healthy" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "database": "error", "status": "unhealthy" })),
            )
        }
    }
}
