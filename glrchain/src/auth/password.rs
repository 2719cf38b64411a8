// パスワードハッシュ化と検証（bcrypt実装）

use crate::common::error::GlrError;
use bcrypt::{hash, verify};
use std::sync::OnceLock;

/// パスワードハッシュ化のコスト
#[cfg(not(test))]
const HASH_COST: u32 = 12;
#[cfg(test)]
const HASH_COST: u32 = 4;

/// パスワードの最小長
pub const MIN_PASSWORD_LEN: usize = 8;

/// 存在しないユーザーのログイン時に照合するハッシュ（プロセス内で一度だけ生成）
static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// パスワードをbcryptでハッシュ化
///
/// # Returns
/// * `Ok(String)` - bcryptハッシュ文字列（$2b$で始まる）
/// * `Err(GlrError)` - ハッシュ化失敗
pub fn hash_password(password: &str) -> Result<String, GlrError> {
    hash(password, HASH_COST)
        .map_err(|e| GlrError::PasswordHash(format!("Failed to hash password: {}", e)))
}

/// パスワードを検証
///
/// # Returns
/// * `Ok(true)` - パスワード一致
/// * `Ok(false)` - パスワード不一致
/// * `Err(GlrError)` - 検証失敗（ハッシュ形式不正など）
pub fn verify_password(password: &str, hash: &str) -> Result<bool, GlrError> {
    verify(password, hash)
        .map_err(|e| GlrError::PasswordHash(format!("Failed to verify password: {}", e)))
}

/// 照合用のダミーハッシュを用意する（初回のみbcryptを実行）
pub fn warm_dummy_hash() -> Result<(), GlrError> {
    if DUMMY_HASH.get().is_none() {
        let generated = hash_password("glrchain-no-such-user")?;
        let _ = DUMMY_HASH.set(generated);
    }
    Ok(())
}

/// ダミーハッシュに対してパスワードを照合する
///
/// 未登録ユーザーでも登録済みユーザーと同じコストのbcrypt照合を行い、
/// 応答時間からユーザー名の存在が分からないようにする。結果は常に不一致。
pub fn verify_dummy_password(password: &str) -> Result<(), GlrError> {
    warm_dummy_hash()?;
    if let Some(dummy) = DUMMY_HASH.get() {
        verify_password(password, dummy)?;
    }
    Ok(())
}
