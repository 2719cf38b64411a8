//! ロギング初期化ユーティリティ
//!
//! 標準出力へのfmtレイヤーに加え、`GLRCHAIN_LOG_DIR` が設定されている場合は
//! 日次ローテーションのファイルにも出力する。

use crate::config::get_env_with_fallback;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// ログファイル名のプレフィックス
const LOG_FILE_PREFIX: &str = "glrchain.log";

/// ログレベル指定を解決する（`GLRCHAIN_LOG_LEVEL` → `RUST_LOG` → `info`）
pub fn filter_directive() -> String {
    get_env_with_fallback("GLRCHAIN_LOG_LEVEL", "RUST_LOG").unwrap_or_else(|| "info".to_string())
}

/// グローバルsubscriberを初期化する
///
/// 返された`WorkerGuard`はプロセス終了まで保持すること（dropするとファイル出力が止まる）。
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let directive = filter_directive();
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}': {}; falling back to info", directive, e);
        EnvFilter::new("info")
    });

    let (file_layer, guard) = match get_env_with_fallback("GLRCHAIN_LOG_DIR", "LOG_DIR") {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
