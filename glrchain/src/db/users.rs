// ユーザーCRUD操作

use crate::common::auth::{User, UserRole};
use crate::common::error::GlrError;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use uuid::Uuid;

/// 最初のユーザーなら管理者、それ以外は通報者として作成する
///
/// 件数確認と挿入を同一トランザクションで行う。
pub async fn create_with_default_role(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> Result<User, GlrError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| GlrError::Database(format!("Failed to begin transaction: {}", e)))?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| GlrError::Database(format!("Failed to count users: {}", e)))?;
    let role = if existing == 0 {
        UserRole::Admin
    } else {
        UserRole::Reporter
    };

    let user = insert(&mut *tx, username, password_hash, role).await?;

    tx.commit()
        .await
        .map_err(|e| GlrError::Database(format!("Failed to commit user: {}", e)))?;

    Ok(user)
}

/// ユーザーを挿入する
///
/// # Returns
/// * `Ok(User)` - 作成されたユーザー
/// * `Err(GlrError::Conflict)` - ユーザー名重複
async fn insert<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
    role: UserRole,
) -> Result<User, GlrError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, role, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(username)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(created_at.to_rfc3339())
    .execute(executor)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            GlrError::Conflict(format!("Username '{}' already exists", username))
        } else {
            GlrError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(User {
        id,
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at,
    })
}

/// ユーザー名でユーザーを検索
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, GlrError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(|e| GlrError::Database(format!("Failed to find user: {}", e)))?;

    row.map(UserRow::into_user).transpose()
}

/// IDでユーザーを検索
pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, GlrError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, role, created_at FROM users WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
    .map_err(|e| GlrError::Database(format!("Failed to find user: {}", e)))?;

    row.map(UserRow::into_user).transpose()
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, GlrError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| GlrError::Database(format!("Invalid user id '{}': {}", self.id, e)))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| GlrError::Database(format!("Invalid user timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            role: UserRole::from_db(&self.role),
            created_at,
        })
    }
}
