// 認証ミドルウェア実装

use crate::api::error::AppError;
use crate::common::auth::Claims;
use crate::common::error::GlrError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// `Authorization: Bearer <token>` からトークンを取り出す
///
/// ヘッダーが無ければ `Ok(None)`、形式が不正なら `Err`。
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, GlrError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| GlrError::Authentication("Invalid Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Some)
        .ok_or_else(|| {
            GlrError::Authentication("Invalid Authorization header format".to_string())
        })
}

/// 任意認証: トークンがあれば検証してクレームを返す
///
/// トークンが無い場合は匿名として `Ok(None)`。トークンがあるのに無効な場合はエラー
/// （無効なトークンを黙って匿名扱いにはしない）。
pub fn optional_claims(headers: &HeaderMap, jwt_secret: &str) -> Result<Option<Claims>, GlrError> {
    match bearer_token(headers)? {
        Some(token) => crate::auth::jwt::verify_jwt(token, jwt_secret).map(Some),
        None => Ok(None),
    }
}

/// JWT認証ミドルウェア
///
/// 検証済みの `Claims` をリクエストの拡張データに格納する。
/// トークンが無い・無効な場合は401。
pub async fn jwt_auth_middleware(
    State(jwt_secret): State<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(request.headers())
        .map_err(|e| AppError(e).into_response())?
        .ok_or_else(|| {
            AppError(GlrError::Authentication(
                "Missing Authorization header".to_string(),
            ))
            .into_response()
        })?
        .to_string();

    let claims = crate::auth::jwt::verify_jwt(&token, &jwt_secret).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        AppError(e).into_response()
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
