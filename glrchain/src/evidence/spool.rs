//! アップロードのスプール
//!
//! マルチパートのファイルパートをチャンク単位で一時ファイルに書き出す。
//! 一時ファイルは [`SpooledFile`] がdropされた時点で削除されるため、
//! リクエストが成功しても失敗しても残らない。

use crate::common::error::{GlrError, GlrResult};
use crate::evidence::digest::StreamingDigest;
use crate::evidence::packager::EvidenceSource;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

const SPOOL_FILE_PREFIX: &str = "glrchain-upload-";
const MAX_FILE_NAME_CHARS: usize = 255;

/// 受信したファイル名をベース名に正規化する
///
/// ディレクトリ成分を取り除き、制御文字を除去する。空になった場合は `"upload"`。
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "upload".to_string(),
        _ => cleaned,
    }
}

/// スプール先ディレクトリとファイルサイズ上限
#[derive(Debug, Clone)]
pub struct UploadSpool {
    dir: PathBuf,
    max_file_bytes: u64,
}

impl UploadSpool {
    /// 作成
    pub fn new(dir: impl Into<PathBuf>, max_file_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes,
        }
    }

    /// 新しいアップロードの書き込みを開始する
    pub async fn begin(&self, original_name: &str) -> GlrResult<SpooledUpload> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            GlrError::StorageWrite(format!(
                "failed to create spool directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let named = tempfile::Builder::new()
            .prefix(SPOOL_FILE_PREFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| {
                GlrError::StorageWrite(format!(
                    "failed to create spool file in {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;
        let (file, temp) = named.into_parts();

        Ok(SpooledUpload {
            file: tokio::fs::File::from_std(file),
            temp,
            name: sanitize_file_name(original_name),
            digest: StreamingDigest::new(),
            max_file_bytes: self.max_file_bytes,
        })
    }
}

/// 書き込み中のアップロード
#[derive(Debug)]
pub struct SpooledUpload {
    file: tokio::fs::File,
    temp: TempPath,
    name: String,
    digest: StreamingDigest,
    max_file_bytes: u64,
}

impl SpooledUpload {
    /// チャンクを追記する（上限超過で `PayloadTooLarge`）
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> GlrResult<()> {
        if self.digest.len() + chunk.len() as u64 > self.max_file_bytes {
            return Err(GlrError::PayloadTooLarge(format!(
                "file '{}' exceeds {} bytes",
                self.name, self.max_file_bytes
            )));
        }
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| GlrError::StorageWrite(format!("failed to spool upload: {}", e)))?;
        self.digest.update(chunk);
        Ok(())
    }

    /// 書き込みを確定する
    pub async fn finish(mut self) -> GlrResult<SpooledFile> {
        self.file
            .flush()
            .await
            .map_err(|e| GlrError::StorageWrite(format!("failed to flush spool file: {}", e)))?;
        drop(self.file);

        let size = self.digest.len();
        Ok(SpooledFile {
            temp: self.temp,
            name: self.name,
            size,
            sha256: self.digest.finalize_hex(),
        })
    }
}

/// スプール済みファイル（dropで削除）
#[derive(Debug)]
pub struct SpooledFile {
    temp: TempPath,
    /// サニタイズ済みファイル名
    pub name: String,
    /// バイト数
    pub size: u64,
    /// 受信時に計算したSHA-256
    pub sha256: String,
}

impl SpooledFile {
    /// 一時ファイルのパス
    pub fn path(&self) -> &Path {
        &self.temp
    }

    /// パッケージャへ渡す参照（受信時のダイジェスト付き）
    pub fn source(&self) -> EvidenceSource {
        EvidenceSource::new(self.name.clone(), self.path().to_path_buf())
            .with_sha256(self.sha256.clone())
    }
}
