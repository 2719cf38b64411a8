// データベース初期化とマイグレーション実行

use crate::common::error::GlrError;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::path::Path;

/// SQLiteファイルの親ディレクトリを作成する（`sqlite:data/x.db` → `data/`）
fn ensure_parent_dir(database_url: &str) -> Result<(), GlrError> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(':') {
        return Ok(());
    }
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GlrError::Database(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// SQLiteデータベース接続プールを作成する
///
/// データベースファイルが無ければ作成する。`migrate` が真ならマイグレーションも実行する。
///
/// # Arguments
/// * `database_url` - データベースURL（例: "sqlite:data/glrchain.db"）
/// * `migrate` - マイグレーションを実行するか
pub async fn initialize_database(database_url: &str, migrate: bool) -> Result<SqlitePool, GlrError> {
    ensure_parent_dir(database_url)?;

    if !Sqlite::database_exists(database_url)
        .await
        .map_err(|e| GlrError::Database(format!("Failed to check database: {}", e)))?
    {
        tracing::info!("Creating database: {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .map_err(|e| GlrError::Database(format!("Failed to create database: {}", e)))?;
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .map_err(|e| GlrError::Database(format!("Failed to connect to database: {}", e)))?;

    if migrate {
        run_migrations(&pool).await?;
    } else {
        tracing::info!("Automatic migrations disabled; run `glrchain migrate` to apply them");
    }

    Ok(pool)
}

/// マイグレーションを実行（sqlx::migrate!マクロを使用）
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), GlrError> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| GlrError::Database(format!("Failed to run migrations: {}", e)))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// 接続確認（`SELECT 1`）
pub async fn ping(pool: &SqlitePool) -> Result<(), GlrError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| GlrError::Database(format!("Database ping failed: {}", e)))
}
