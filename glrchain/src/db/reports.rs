// テキスト通報の永続化

use crate::common::error::GlrError;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// テキスト通報（説明文は暗号化済み）
#[derive(Debug, Clone)]
pub struct ReportRecord {
    pub id: Uuid,
    pub reporter: String,
    pub location: String,
    pub description_enc: String,
    pub created_at: DateTime<Utc>,
}

/// 通報を保存
pub async fn insert(pool: &SqlitePool, report: &ReportRecord) -> Result<(), GlrError> {
    sqlx::query(
        "INSERT INTO reports (id, reporter, location, description_enc, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(report.id.to_string())
    .bind(&report.reporter)
    .bind(&report.location)
    .bind(&report.description_enc)
    .bind(report.created_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| GlrError::Database(format!("Failed to insert report: {}", e)))?;

    Ok(())
}

/// 保存済みの暗号化説明文を取得
pub async fn find_description_enc(pool: &SqlitePool, id: Uuid) -> Result<Option<String>, GlrError> {
    sqlx::query_scalar("SELECT description_enc FROM reports WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| GlrError::Database(format!("Failed to find report: {}", e)))
}
