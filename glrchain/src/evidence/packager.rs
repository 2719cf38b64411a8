//! 証拠パッケージャ
//!
//! 証拠ファイルを読み込み、ファイル毎のSHA-256を計算してバンドルを組み立て、
//! 正規化バイト列のSHA-256（バンドルダイジェスト）をファイル名にして保存する。
//!
//! 保存は同じディレクトリ内の一時ファイルに書いてから rename するため、
//! 書き込み失敗時に壊れたバンドルが残ることはない。同一内容の同時書き込みは
//! 同一バイト列で同じパスを上書きするだけなのでロック不要。

use crate::common::error::{GlrError, GlrResult};
use crate::config::AppConfig;
use crate::evidence::bundle::{
    bundle_file_name, digest_from_file_name, EvidenceBundle, EvidenceFileRecord, IncidentMetadata,
};
use crate::evidence::digest::{is_sha256_hex, sha256_hex};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// 参照された証拠ファイルが存在しない場合の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingEvidencePolicy {
    /// 警告ログを出してバンドルから除外する
    #[default]
    Skip,
    /// パッケージング全体を失敗させる
    Fail,
}

impl MissingEvidencePolicy {
    /// 設定値としての表現
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingEvidencePolicy::Skip => "skip",
            MissingEvidencePolicy::Fail => "fail",
        }
    }
}

impl std::fmt::Display for MissingEvidencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingEvidencePolicy {
    type Err = GlrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingEvidencePolicy::Skip),
            "fail" => Ok(MissingEvidencePolicy::Fail),
            other => Err(GlrError::Common(crate::common::error::CommonError::Config(
                format!("unknown missing evidence policy '{}' (expected skip|fail)", other),
            ))),
        }
    }
}

/// パッケージ対象の証拠ファイル参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSource {
    /// バンドルに記録する名前
    pub name: String,
    /// 読み込み元
    pub path: PathBuf,
    /// 受信時に計算済みのSHA-256（あればパッケージング時の値と照合する）
    pub sha256: Option<String>,
}

impl EvidenceSource {
    /// 名前とパスを指定して作成
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sha256: None,
        }
    }

    /// 受信時のダイジェストを添える
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// パスのベース名を名前として使う
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            sha256: None,
        }
    }
}

/// パッケージング結果
#[derive(Debug, Clone)]
pub struct PackagedEvidence {
    /// バンドルダイジェスト（16進）
    pub digest: String,
    /// 保存先
    pub path: PathBuf,
    /// 保存したバンドル
    pub bundle: EvidenceBundle,
}

/// 保存済みバンドルの検証結果
#[derive(Debug, Clone, Serialize)]
pub struct BundleVerification {
    /// 検証したファイル
    pub path: PathBuf,
    /// ファイル名から読み取ったダイジェスト
    pub expected_digest: Option<String>,
    /// 内容から再計算したダイジェスト
    pub actual_digest: String,
    /// 内容が正規形そのものか
    pub canonical: bool,
    /// 総合判定
    pub valid: bool,
}

/// 証拠パッケージャ
#[derive(Debug, Clone)]
pub struct EvidencePackager {
    evidence_dir: PathBuf,
    policy: MissingEvidencePolicy,
    max_file_bytes: u64,
}

impl EvidencePackager {
    /// 保存先ディレクトリ、欠損ポリシー、ファイルサイズ上限を指定して作成
    pub fn new(
        evidence_dir: impl Into<PathBuf>,
        policy: MissingEvidencePolicy,
        max_file_bytes: u64,
    ) -> Self {
        Self {
            evidence_dir: evidence_dir.into(),
            policy,
            max_file_bytes,
        }
    }

    /// 設定から作成
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.evidence_dir.clone(),
            config.missing_evidence,
            config.max_file_bytes,
        )
    }

    /// 証拠をパッケージングして保存する（ブロッキングI/Oはblockingプールで実行）
    pub async fn package(
        &self,
        meta: &IncidentMetadata,
        sources: &[EvidenceSource],
    ) -> GlrResult<PackagedEvidence> {
        let packager = self.clone();
        let meta = meta.clone();
        let sources = sources.to_vec();
        tokio::task::spawn_blocking(move || packager.package_blocking(&meta, &sources))
            .await
            .map_err(|e| GlrError::Internal(format!("packaging task failed: {}", e)))?
    }

    /// [`Self::package`] の同期版
    pub fn package_blocking(
        &self,
        meta: &IncidentMetadata,
        sources: &[EvidenceSource],
    ) -> GlrResult<PackagedEvidence> {
        let mut files = Vec::with_capacity(sources.len());
        for source in sources {
            if let Some(record) = self.read_source(source)? {
                files.push(record);
            }
        }

        let bundle = EvidenceBundle {
            meta: meta.clone(),
            files,
        };
        let raw = bundle.canonical_bytes()?;
        let digest = sha256_hex(&raw);
        let path = self.persist(&digest, &raw)?;

        info!(
            evidence_hash = %digest,
            files = bundle.files.len(),
            bytes = raw.len(),
            path = %path.display(),
            "Packaged evidence bundle"
        );

        Ok(PackagedEvidence {
            digest,
            path,
            bundle,
        })
    }

    fn read_source(&self, source: &EvidenceSource) -> GlrResult<Option<EvidenceFileRecord>> {
        let file = match File::open(&source.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return match self.policy {
                    MissingEvidencePolicy::Skip => {
                        warn!(
                            name = %source.name,
                            path = %source.path.display(),
                            "Evidence file missing at packaging time; excluded from bundle"
                        );
                        Ok(None)
                    }
                    MissingEvidencePolicy::Fail => Err(GlrError::MissingEvidence(format!(
                        "{} ({})",
                        source.name,
                        source.path.display()
                    ))),
                };
            }
            Err(e) => {
                return Err(GlrError::Internal(format!(
                    "failed to open evidence file {}: {}",
                    source.path.display(),
                    e
                )))
            }
        };

        let mut data = Vec::new();
        file.take(self.max_file_bytes.saturating_add(1))
            .read_to_end(&mut data)
            .map_err(|e| {
                GlrError::Internal(format!(
                    "failed to read evidence file {}: {}",
                    source.path.display(),
                    e
                ))
            })?;
        if data.len() as u64 > self.max_file_bytes {
            return Err(GlrError::PayloadTooLarge(format!(
                "evidence file '{}' exceeds {} bytes",
                source.name, self.max_file_bytes
            )));
        }

        let sha256 = sha256_hex(&data);
        if let Some(expected) = &source.sha256 {
            if *expected != sha256 {
                return Err(GlrError::Internal(format!(
                    "evidence file {} changed after upload (received {}, packaging {})",
                    source.path.display(),
                    expected,
                    sha256
                )));
            }
        }

        let record = EvidenceFileRecord {
            name: source.name.clone(),
            sha256,
            size: data.len() as u64,
        };
        debug!(name = %record.name, sha256 = %record.sha256, size = record.size, "Digested evidence file");
        Ok(Some(record))
    }

    fn persist(&self, digest: &str, raw: &[u8]) -> GlrResult<PathBuf> {
        let storage_err = |what: &str, e: std::io::Error| {
            GlrError::StorageWrite(format!(
                "{} in {}: {}",
                what,
                self.evidence_dir.display(),
                e
            ))
        };

        fs::create_dir_all(&self.evidence_dir)
            .map_err(|e| storage_err("failed to create evidence directory", e))?;

        let target = self.evidence_dir.join(bundle_file_name(digest));
        let mut tmp = tempfile::Builder::new()
            .prefix(".evidence_")
            .suffix(".tmp")
            .tempfile_in(&self.evidence_dir)
            .map_err(|e| storage_err("failed to create temporary bundle file", e))?;
        tmp.write_all(raw)
            .map_err(|e| storage_err("failed to write bundle", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| storage_err("failed to sync bundle", e))?;
        tmp.persist(&target)
            .map_err(|e| storage_err("failed to move bundle into place", e.error))?;

        Ok(target)
    }

    /// ダイジェストから保存先パスを導出する（16進64桁以外は拒否）
    pub fn bundle_path(&self, digest: &str) -> GlrResult<PathBuf> {
        if !is_sha256_hex(digest) {
            return Err(GlrError::validation(
                "evidence hash must be 64 lowercase hex characters",
            ));
        }
        Ok(self.evidence_dir.join(bundle_file_name(digest)))
    }

    /// 保存済みバンドルファイルを検証する（[`verify_bundle_file`] 参照）
    pub async fn verify(&self, path: &Path) -> GlrResult<BundleVerification> {
        verify_bundle_file(path).await
    }

    /// ダイジェストで保存済みバンドルを読み込む
    pub async fn load(&self, digest: &str) -> GlrResult<EvidenceBundle> {
        let path = self.bundle_path(digest)?;
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GlrError::NotFound(format!("evidence bundle {}", digest)))
            }
            Err(e) => {
                return Err(GlrError::Internal(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_slice(&raw).map_err(|e| {
            GlrError::Internal(format!("corrupt evidence bundle {}: {}", path.display(), e))
        })
    }
}

/// 保存済みバンドルファイルの完全性を検証する
///
/// 内容のSHA-256がファイル名のダイジェストと一致し、かつ内容が正規形であれば有効。
pub async fn verify_bundle_file(path: &Path) -> GlrResult<BundleVerification> {
    let raw = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => GlrError::NotFound(path.display().to_string()),
        _ => GlrError::Internal(format!("failed to read {}: {}", path.display(), e)),
    })?;

    let actual_digest = sha256_hex(&raw);
    let expected_digest = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(digest_from_file_name)
        .map(str::to_string);

    let canonical = match serde_json::from_slice::<EvidenceBundle>(&raw) {
        Ok(bundle) => bundle
            .canonical_bytes()
            .map(|bytes| bytes == raw)
            .unwrap_or(false),
        Err(_) => false,
    };

    let valid = canonical && expected_digest.as_deref() == Some(actual_digest.as_str());
    if !valid {
        warn!(
            path = %path.display(),
            expected = ?expected_digest,
            actual = %actual_digest,
            canonical,
            "Evidence bundle failed verification"
        );
    }

    Ok(BundleVerification {
        path: path.to_path_buf(),
        expected_digest,
        actual_digest,
        canonical,
        valid,
    })
}
