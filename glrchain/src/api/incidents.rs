//! インシデント通報API
//!
//! マルチパートで受け取った証拠ファイルをスプールし、パッケージングして
//! インシデントとして記録する。

use super::error::AppError;
use crate::auth::middleware::optional_claims;
use crate::common::auth::{Claims, UserRole};
use crate::common::error::GlrError;
use crate::config::parse_flag;
use crate::db::incidents::{IncidentRecord, STATUS_NEW};
use crate::evidence::{EvidenceBundle, EvidenceSource, IncidentMetadata, SpooledFile};
use crate::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 証拠ファイルのフォームフィールド名
const FILES_FIELD: &str = "files";

/// 通報受付レスポンス
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// インシデントID（ハイフン無し32桁16進）
    pub incident_id: String,
    /// 証拠バンドルのダイジェスト
    pub evidence_hash: String,
    /// 証拠バンドルの保存先
    pub pkg: String,
}

/// インシデント詳細
#[derive(Debug, Serialize)]
pub struct IncidentResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
    pub auto: bool,
    pub status: String,
    pub evidence_hash: String,
    pub pkg: String,
    pub file_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// フォームから集めた値
#[derive(Debug, Default)]
struct ReportForm {
    title: Option<String>,
    description: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    auto: Option<String>,
    files: Vec<SpooledFile>,
}

impl ReportForm {
    fn into_parts(self) -> Result<(IncidentMetadata, Vec<SpooledFile>), GlrError> {
        let required = |value: Option<String>, name: &str| {
            value.ok_or_else(|| GlrError::validation(format!("{} is required", name)))
        };
        let coordinate = |value: Option<String>, name: &str| -> Result<f64, GlrError> {
            required(value, name)?
                .trim()
                .parse::<f64>()
                .map_err(|_| GlrError::validation(format!("{} must be a number", name)))
        };

        let auto = match self.auto {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| GlrError::validation("auto must be a boolean"))?,
            None => false,
        };

        let meta = IncidentMetadata {
            title: required(self.title, "title")?,
            description: required(self.description, "description")?,
            lat: coordinate(self.lat, "lat")?,
            lon: coordinate(self.lon, "lon")?,
            auto,
        };
        meta.validate()?;
        Ok((meta, self.files))
    }
}

/// マルチパート本体を読み、ファイルパートはスプールへストリーミングする
async fn read_form(state: &AppState, mut multipart: Multipart) -> Result<ReportForm, AppError> {
    let mut form = ReportForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILES_FIELD => {
                let original = field.file_name().unwrap_or_default().to_string();
                let mut upload = state.spool.begin(&original).await?;
                while let Some(chunk) = field.chunk().await? {
                    upload.write_chunk(&chunk).await?;
                }
                let spooled = upload.finish().await?;
                // ファイル未選択のフォーム送信は名前も中身も空のパートとして届く
                if original.is_empty() && spooled.size == 0 {
                    continue;
                }
                tracing::debug!(
                    name = %spooled.name,
                    size = spooled.size,
                    sha256 = %spooled.sha256,
                    "Spooled evidence upload"
                );
                form.files.push(spooled);
            }
            "title" => form.title = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "lat" => form.lat = Some(field.text().await?),
            "lon" => form.lon = Some(field.text().await?),
            "auto" => form.auto = Some(field.text().await?),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn reporter_id(headers: &HeaderMap, jwt_secret: &str) -> Result<Option<Uuid>, GlrError> {
    optional_claims(headers, jwt_secret)?
        .map(|claims| {
            Uuid::parse_str(&claims.sub)
                .map_err(|_| GlrError::Authentication("Invalid subject in token".to_string()))
        })
        .transpose()
}

/// POST /report, POST /incidents/report - 証拠付き通報
///
/// # Returns
/// * `200 OK` - `{incident_id, evidence_hash, pkg}`
/// * `400 Bad Request` - フォーム不正
/// * `413 Payload Too Large` - ファイルサイズ超過
/// * `503 Service Unavailable` - 証拠の保存失敗
pub async fn submit_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ReportResponse>, AppError> {
    let reporter_id = reporter_id(&headers, &state.jwt_secret)?;

    // スプールファイルはこの関数を抜けるときにdropされ削除される
    let (meta, files) = read_form(&state, multipart).await?.into_parts()?;
    let sources: Vec<EvidenceSource> = files.iter().map(SpooledFile::source).collect();

    let packaged = state.packager.package(&meta, &sources).await?;
    let description_enc = state.cipher.encrypt_str(&meta.description)?;

    let incident = IncidentRecord {
        id: Uuid::new_v4(),
        title: meta.title.clone(),
        description_enc,
        lat: meta.lat,
        lon: meta.lon,
        auto: meta.auto,
        evidence_hash: packaged.digest.clone(),
        package_path: packaged.path.display().to_string(),
        file_count: packaged.bundle.files.len() as i64,
        status: STATUS_NEW.to_string(),
        reporter_id,
        created_at: Utc::now(),
    };
    crate::db::incidents::insert(&state.db_pool, &incident).await?;

    tracing::info!(
        incident_id = %incident.id.simple(),
        evidence_hash = %incident.evidence_hash,
        files = incident.file_count,
        auto = incident.auto,
        anonymous = reporter_id.is_none(),
        "Incident reported"
    );

    Ok(Json(ReportResponse {
        incident_id: incident.id.simple().to_string(),
        evidence_hash: incident.evidence_hash,
        pkg: incident.package_path,
    }))
}

/// 管理者は全件、通報者は自分が通報したインシデントのみ閲覧できる
fn authorize_read(claims: &Claims, incident: &IncidentRecord) -> Result<(), GlrError> {
    if claims.role == UserRole::Admin {
        return Ok(());
    }
    let caller = Uuid::parse_str(&claims.sub).ok();
    if caller.is_some() && caller == incident.reporter_id {
        return Ok(());
    }
    Err(GlrError::Authorization(format!(
        "user {} may not read incident {}",
        claims.sub,
        incident.id.simple()
    )))
}

async fn load_incident(
    state: &AppState,
    claims: &Claims,
    id: &str,
) -> Result<IncidentRecord, GlrError> {
    let id = Uuid::parse_str(id).map_err(|_| GlrError::NotFound(format!("incident {}", id)))?;
    let incident = crate::db::incidents::find_by_id(&state.db_pool, id)
        .await?
        .ok_or_else(|| GlrError::NotFound(format!("incident {}", id)))?;
    authorize_read(claims, &incident)?;
    Ok(incident)
}

/// GET /incidents/:id - インシデント詳細（要認証）
///
/// # Returns
/// * `200 OK` - インシデント詳細（説明文は復号済み）
/// * `403 Forbidden` - 他人の通報を通報者ロールで参照した
/// * `404 Not Found` - 存在しないID
pub async fn get_incident(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<IncidentResponse>, AppError> {
    let incident = load_incident(&state, &claims, &id).await?;
    let description = state.cipher.decrypt_str(&incident.description_enc)?;

    Ok(Json(IncidentResponse {
        id: incident.id.simple().to_string(),
        title: incident.title,
        description,
        lat: incident.lat,
        lon: incident.lon,
        auto: incident.auto,
        status: incident.status,
        evidence_hash: incident.evidence_hash,
        pkg: incident.package_path,
        file_count: incident.file_count,
        reporter_id: incident.reporter_id.map(|id| id.to_string()),
        created_at: incident.created_at,
    }))
}

/// GET /incidents/:id/evidence - 保存済み証拠バンドル（要認証）
pub async fn get_incident_evidence(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<EvidenceBundle>, AppError> {
    let incident = load_incident(&state, &claims, &id).await?;
    let bundle = state.packager.load(&incident.evidence_hash).await?;
    Ok(Json(bundle))
}
