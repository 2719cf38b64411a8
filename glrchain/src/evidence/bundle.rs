//! 証拠バンドルと正規化シリアライズ
//!
//! バンドルは RFC 8785 (JCS) で正規化する:
//!
//! - キーは辞書順（構造体のフィールド順に依存しない）
//! - 空白なし、UTF-8
//! - 数値はECMAScriptの最短表現（`1.0` → `1`）
//!
//! `files` 配列は入力順を保持する。順序も証拠記録の一部であり、
//! 並べ替えるとダイジェストが変わる。

use crate::common::error::{GlrError, GlrResult};
use crate::evidence::digest::{is_sha256_hex, sha256_hex};
use serde::{Deserialize, Serialize};

/// 永続化ファイル名のプレフィックス
pub const BUNDLE_FILE_PREFIX: &str = "evidence_";
/// 永続化ファイル名のサフィックス
pub const BUNDLE_FILE_SUFFIX: &str = ".json";

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 10_000;

/// インシデント通報のメタデータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentMetadata {
    /// 件名
    pub title: String,
    /// 自由記述
    pub description: String,
    /// 緯度
    pub lat: f64,
    /// 経度
    pub lon: f64,
    /// 自動検知による通報か
    pub auto: bool,
}

impl IncidentMetadata {
    /// 受信メタデータの形状を検証する
    pub fn validate(&self) -> GlrResult<()> {
        if self.title.trim().is_empty() {
            return Err(GlrError::validation("title must not be empty"));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(GlrError::validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(GlrError::validation(format!(
                "description must be at most {} characters",
                MAX_DESCRIPTION_CHARS
            )));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(GlrError::validation("lat must be a number within [-90, 90]"));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(GlrError::validation(
                "lon must be a number within [-180, 180]",
            ));
        }
        Ok(())
    }
}

/// 証拠ファイル1件分の記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFileRecord {
    /// 元のファイル名（ベース名のみ）
    pub name: String,
    /// 内容のSHA-256（16進）
    pub sha256: String,
    /// バイト数
    pub size: u64,
}

/// メタデータと証拠ファイル記録の組
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// 通報メタデータ
    pub meta: IncidentMetadata,
    /// 証拠ファイル（入力順）
    pub files: Vec<EvidenceFileRecord>,
}

impl EvidenceBundle {
    /// 正規化バイト列を生成
    pub fn canonical_bytes(&self) -> GlrResult<Vec<u8>> {
        canonical_bytes(self)
    }

    /// 正規化バイト列のSHA-256
    pub fn digest(&self) -> GlrResult<String> {
        Ok(sha256_hex(&self.canonical_bytes()?))
    }
}

/// バンドルを正規化JSONに変換する
///
/// 非有限の座標は正規形を持たないため `GlrError::Serialization` を返す。
pub fn canonical_bytes(bundle: &EvidenceBundle) -> GlrResult<Vec<u8>> {
    for (field, value) in [("meta.lat", bundle.meta.lat), ("meta.lon", bundle.meta.lon)] {
        if !value.is_finite() {
            return Err(GlrError::Serialization(format!(
                "{}: {} has no canonical representation",
                field, value
            )));
        }
    }
    serde_jcs::to_vec(bundle)
        .map_err(|e| GlrError::Serialization(format!("failed to canonicalize bundle: {}", e)))
}

/// ダイジェストから永続化ファイル名を導出
pub fn bundle_file_name(digest: &str) -> String {
    format!("{}{}{}", BUNDLE_FILE_PREFIX, digest, BUNDLE_FILE_SUFFIX)
}

/// 永続化ファイル名からダイジェストを取り出す
pub fn digest_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(BUNDLE_FILE_PREFIX)?
        .strip_suffix(BUNDLE_FILE_SUFFIX)
        .filter(|digest| is_sha256_hex(digest))
}
