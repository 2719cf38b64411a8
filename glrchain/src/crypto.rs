//! フィールド暗号化（XChaCha20-Poly1305）
//!
//! 暗号文は `base64(nonce(24) || ciphertext || tag(16))` としてDBに保存する。
//! ノンスは暗号化ごとに乱数で生成する。

use crate::common::error::{GlrError, GlrResult};
use crate::config::ENCRYPTION_KEY_LEN;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Key, XChaCha20Poly1305, XNonce,
};

const NONCE_LEN: usize = 24;

/// 新しいフィールド暗号鍵をbase64で生成する
pub fn generate_key() -> String {
    STANDARD.encode(XChaCha20Poly1305::generate_key(&mut OsRng))
}

/// 機密フィールドの暗号化・復号
#[derive(Clone)]
pub struct FieldCipher {
    cipher: XChaCha20Poly1305,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// 32バイト鍵から作成
    pub fn new(key: &[u8; ENCRYPTION_KEY_LEN]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// 文字列を暗号化してbase64で返す
    pub fn encrypt_str(&self, plaintext: &str) -> GlrResult<String> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| GlrError::Crypto("encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    /// [`Self::encrypt_str`] の出力を復号する
    ///
    /// 鍵違い・改ざん・形式不正はすべて `GlrError::Crypto`。
    pub fn decrypt_str(&self, encoded: &str) -> GlrResult<String> {
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| GlrError::Crypto(format!("ciphertext is not valid base64: {}", e)))?;
        if raw.len() < NONCE_LEN {
            return Err(GlrError::Crypto("ciphertext too short".to_string()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| GlrError::Crypto("decryption failed".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|e| GlrError::Crypto(format!("plaintext is not UTF-8: {}", e)))
    }
}
