// インシデントの永続化

use crate::common::error::GlrError;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// 新規インシデントの初期ステータス
pub const STATUS_NEW: &str = "new";

/// 保存済みインシデント（説明文は暗号化状態のまま）
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    /// インシデントID
    pub id: Uuid,
    /// 件名
    pub title: String,
    /// 暗号化済みの説明文
    pub description_enc: String,
    /// 緯度
    pub lat: f64,
    /// 経度
    pub lon: f64,
    /// 自動検知による通報か
    pub auto: bool,
    /// 証拠バンドルのダイジェスト
    pub evidence_hash: String,
    /// 証拠バンドルの保存先
    pub package_path: String,
    /// バンドルに含まれるファイル数
    pub file_count: i64,
    /// 処理状況
    pub status: String,
    /// 通報したユーザー（匿名ならNone）
    pub reporter_id: Option<Uuid>,
    /// 受付日時
    pub created_at: DateTime<Utc>,
}

/// インシデントを保存
pub async fn insert(pool: &SqlitePool, incident: &IncidentRecord) -> Result<(), GlrError> {
    sqlx::query(
        "INSERT INTO incidents (id, title, description_enc, lat, lon, auto, evidence_hash,
                                package_path, file_count, status, reporter_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(incident.id.to_string())
    .bind(&incident.title)
    .bind(&incident.description_enc)
    .bind(incident.lat)
    .bind(incident.lon)
    .bind(incident.auto as i32)
    .bind(&incident.evidence_hash)
    .bind(&incident.package_path)
    .bind(incident.file_count)
    .bind(&incident.status)
    .bind(incident.reporter_id.map(|id| id.to_string()))
    .bind(incident.created_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| GlrError::Database(format!("Failed to insert incident: {}", e)))?;

    Ok(())
}

/// IDでインシデントを検索
pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<IncidentRecord>, GlrError> {
    let row = sqlx::query_as::<_, IncidentRow>(
        "SELECT id, title, description_enc, lat, lon, auto, evidence_hash, package_path,
                file_count, status, reporter_id, created_at
         FROM incidents WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| GlrError::Database(format!("Failed to find incident: {}", e)))?;

    row.map(IncidentRow::into_record).transpose()
}

#[derive(sqlx::FromRow)]
struct IncidentRow {
    id: String,
    title: String,
    description_enc: String,
    lat: f64,
    lon: f64,
    auto: i32,
    evidence_hash: String,
    package_path: String,
    file_count: i64,
    status: String,
    reporter_id: Option<String>,
    created_at: String,
}

impl IncidentRow {
    fn into_record(self) -> Result<IncidentRecord, GlrError> {
        let parse_id = |raw: &str| {
            Uuid::parse_str(raw)
                .map_err(|e| GlrError::Database(format!("Invalid id '{}': {}", raw, e)))
        };
        let id = parse_id(&self.id)?;
        let reporter_id = self.reporter_id.as_deref().map(parse_id).transpose()?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| GlrError::Database(format!("Invalid incident timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(IncidentRecord {
            id,
            title: self.title,
            description_enc: self.description_enc,
            lat: self.lat,
            lon: self.lon,
            auto: self.auto != 0,
            evidence_hash: self.evidence_hash,
            package_path: self.package_path,
            file_count: self.file_count,
            status: self.status,
            reporter_id,
            created_at,
        })
    }
}
