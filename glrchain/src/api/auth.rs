//! 認証API
//!
//! ユーザー登録、ログイン、認証情報確認

use super::error::AppError;
use crate::auth::jwt::{create_jwt, JWT_EXPIRATION_SECS};
use crate::auth::password::{
    hash_password, verify_dummy_password, verify_password, MIN_PASSWORD_LEN,
};
use crate::common::auth::{Claims, User, UserRole};
use crate::common::error::GlrError;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 64;

/// 登録・ログイン共通のリクエスト
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    /// ユーザー名
    pub username: String,
    /// パスワード
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// JWTトークン
    pub access_token: String,
    /// 常に "bearer"
    pub token_type: &'static str,
    /// 有効期限（秒）
    pub expires_in: i64,
}

/// ユーザー情報
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// ユーザーID
    pub id: String,
    /// ユーザー名
    pub username: String,
    /// ロール
    pub role: UserRole,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
        }
    }
}

fn validate_credentials(request: &CredentialsRequest) -> Result<(), GlrError> {
    let username_len = request.username.trim().chars().count();
    if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&username_len) {
        return Err(GlrError::validation(format!(
            "username must be {}-{} characters",
            MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
        )));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GlrError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// POST /auth/register - ユーザー登録
///
/// 最初に登録したユーザーは管理者、以降は通報者になる。
///
/// # Returns
/// * `201 Created` - 登録成功
/// * `400 Bad Request` - 入力不正
/// * `409 Conflict` - ユーザー名重複
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    validate_credentials(&request)?;
    let username = request.username.trim();

    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| GlrError::Internal(format!("password hashing task failed: {}", e)))??;

    let user =
        crate::db::users::create_with_default_role(&state.db_pool, username, &password_hash)
            .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login - ログイン
///
/// # Returns
/// * `200 OK` - ログイン成功（JWT）
/// * `401 Unauthorized` - 認証失敗
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || GlrError::Authentication("Invalid username or password".to_string());

    let Some(user) =
        crate::db::users::find_by_username(&state.db_pool, request.username.trim()).await?
    else {
        // 未登録でも同じコストの照合を行い、応答時間を揃える
        let password = request.password;
        tokio::task::spawn_blocking(move || verify_dummy_password(&password))
            .await
            .map_err(|e| GlrError::Internal(format!("password verification task failed: {}", e)))??;
        tracing::warn!("Login failed: unknown username");
        return Err(invalid().into());
    };

    let password = request.password;
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| GlrError::Internal(format!("password verification task failed: {}", e)))??;
    if !is_valid {
        tracing::warn!(username = %user.username, "Login failed: wrong password");
        return Err(invalid().into());
    }

    let access_token = create_jwt(&user.id.to_string(), user.role, &state.jwt_secret)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer",
        expires_in: JWT_EXPIRATION_SECS,
    }))
}

/// GET /auth/me - 認証情報確認
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| GlrError::Authentication("Invalid subject in token".to_string()))?;

    let user = crate::db::users::find_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| GlrError::Authentication("User no longer exists".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}
