//! GLRChain incident backend
//!
//! 違法採掘の通報を受け付け、証拠ファイルを改ざん検知可能なバンドルとして保存する。

#![warn(missing_docs)]

/// 共通型定義（エラー、認証モデル）
pub mod common;

/// REST APIハンドラー
#[allow(missing_docs)]
pub mod api;

/// 認証・認可機能
pub mod auth;

/// CLIインターフェース
pub mod cli;

/// 設定管理（環境変数ヘルパー）
pub mod config;

/// フィールド暗号化
pub mod crypto;

/// データベースアクセス
#[allow(missing_docs)]
pub mod db;

/// 証拠パッケージング
pub mod evidence;

/// ロギング初期化ユーティリティ
pub mod logging;

/// サーバー起動・シャットダウン
pub mod server;

use std::sync::Arc;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// データベース接続プール
    pub db_pool: sqlx::SqlitePool,
    /// 起動時に読み込んだ設定
    pub config: Arc<config::AppConfig>,
    /// 証拠パッケージャ
    pub packager: evidence::EvidencePackager,
    /// アップロードのスプール
    pub spool: evidence::UploadSpool,
    /// 説明文の暗号化
    pub cipher: crypto::FieldCipher,
    /// JWT秘密鍵
    pub jwt_secret: String,
}

impl AppState {
    /// 設定とDBプールから状態を組み立てる
    pub fn new(config: config::AppConfig, db_pool: sqlx::SqlitePool) -> Self {
        let packager = evidence::EvidencePackager::from_config(&config);
        let spool = evidence::UploadSpool::new(config.spool_dir.clone(), config.max_file_bytes);
        let cipher = crypto::FieldCipher::new(&config.encryption_key);
        let jwt_secret = config.jwt_secret.clone();

        Self {
            db_pool,
            config: Arc::new(config),
            packager,
            spool,
            cipher,
            jwt_secret,
        }
    }
}
