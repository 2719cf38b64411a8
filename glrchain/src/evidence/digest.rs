//! SHA-256ダイジェスト

use sha2::{Digest, Sha256};

/// SHA-256の16進表現の長さ
pub const SHA256_HEX_LEN: usize = 64;

/// バイト列のSHA-256を小文字16進で返す
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// 64桁の小文字16進文字列かどうか
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// チャンク単位で投入できるSHA-256（アップロードのスプール用）
#[derive(Clone, Default)]
pub struct StreamingDigest {
    hasher: Sha256,
    len: u64,
}

impl std::fmt::Debug for StreamingDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingDigest")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl StreamingDigest {
    /// 空の状態で作成
    pub fn new() -> Self {
        Self::default()
    }

    /// チャンクを追加
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// これまでに投入したバイト数
    pub fn len(&self) -> u64 {
        self.len
    }

    /// 何も投入されていないか
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 16進ダイジェストを確定
    pub fn finalize_hex(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}
