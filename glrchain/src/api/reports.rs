//! テキスト通報API

use super::error::AppError;
use crate::common::error::GlrError;
use crate::db::reports::ReportRecord;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_FIELD_CHARS: usize = 10_000;

/// 通報リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateReportRequest {
    /// 通報者名
    pub reporter: String,
    /// 場所（自由記述）
    pub location: String,
    /// 内容
    pub description: String,
}

/// 通報受付レスポンス
#[derive(Debug, Serialize)]
pub struct CreateReportResponse {
    pub id: String,
    pub message: &'static str,
}

impl CreateReportRequest {
    fn validate(&self) -> Result<(), GlrError> {
        for (name, value) in [
            ("reporter", &self.reporter),
            ("location", &self.location),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(GlrError::validation(format!("{} must not be empty", name)));
            }
            if value.chars().count() > MAX_FIELD_CHARS {
                return Err(GlrError::validation(format!(
                    "{} must be at most {} characters",
                    name, MAX_FIELD_CHARS
                )));
            }
        }
        Ok(())
    }
}

/// POST /reports - テキスト通報（説明文は暗号化して保存）
pub async fn create_report(
    State(state): State<AppState>,
    Json(request): Json<CreateReportRequest>,
) -> Result<Json<CreateReportResponse>, AppError> {
    request.validate()?;

    let report = ReportRecord {
        id: Uuid::new_v4(),
        reporter: request.reporter,
        location: request.location,
        description_enc: state.cipher.encrypt_str(&request.description)?,
        created_at: Utc::now(),
    };
    crate::db::reports::insert(&state.db_pool, &report).await?;

    tracing::info!(report_id = %report.id, "Report received");
    Ok(Json(CreateReportResponse {
        id: report.id.to_string(),
        message: "Report received",
    }))
}
