//! migrate サブコマンド
//!
//! マイグレーションを適用して終了します（暗号鍵などの設定は不要）。

use crate::config::get_env_with_fallback_or;
use clap::Args;

/// migrate サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Database URL (default: GLRCHAIN_DATABASE_URL or sqlite:data/glrchain.db)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// マイグレーションを実行する
pub async fn execute(args: &MigrateArgs) -> anyhow::Result<()> {
    let database_url = args.database_url.clone().unwrap_or_else(|| {
        get_env_with_fallback_or(
            "GLRCHAIN_DATABASE_URL",
            "DATABASE_URL",
            "sqlite:data/glrchain.db",
        )
    });

    let pool = crate::db::migrations::initialize_database(&database_url, true).await?;
    pool.close().await;

    tracing::info!(database_url = %database_url, "Migrations applied");
    Ok(())
}
