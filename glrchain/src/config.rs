//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names with warning logs, and the process-wide
//! [`AppConfig`] that is loaded and validated once at startup.

use crate::common::error::{CommonError, GlrError};
use crate::evidence::MissingEvidencePolicy;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::PathBuf;

/// Field encryption key length (XChaCha20-Poly1305)
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Minimum accepted JWT secret length in bytes
pub const MIN_JWT_SECRET_LEN: usize = 16;

const DEFAULT_MAX_FILE_BYTES: u64 = 25 * 1024 * 1024;
const DEFAULT_MAX_REQUEST_BYTES: usize = 100 * 1024 * 1024;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use glrchain::config::get_env_with_fallback;
///
/// let url = get_env_with_fallback("GLRCHAIN_DATABASE_URL", "DATABASE_URL");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither variable is set. A value that is set but does
/// not parse is a configuration error.
pub fn get_env_with_fallback_parse<T>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> Result<T, GlrError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_with_fallback(new_name, old_name) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            GlrError::Common(CommonError::Config(format!(
                "{} has an invalid value {:?}: {}",
                new_name, raw, e
            )))
        }),
        None => Ok(default),
    }
}

/// 真偽値の環境変数を読む。解釈できない値は設定エラー
fn get_env_flag(new_name: &str, old_name: &str, default: bool) -> Result<bool, GlrError> {
    match get_env_with_fallback(new_name, old_name) {
        Some(raw) => parse_flag(&raw).ok_or_else(|| {
            GlrError::Common(CommonError::Config(format!(
                "{} must be a boolean (true/false/1/0/yes/no/on/off), got {:?}",
                new_name, raw
            )))
        }),
        None => Ok(default),
    }
}

/// サイズ上限を読む。0は上限として意味を持たないため拒否する
fn get_env_limit<T>(new_name: &str, old_name: &str, default: T) -> Result<T, GlrError>
where
    T: std::str::FromStr + PartialEq + From<u8>,
    T::Err: std::fmt::Display,
{
    let value = get_env_with_fallback_parse(new_name, old_name, default)?;
    if value == T::from(0) {
        return Err(GlrError::Common(CommonError::Config(format!(
            "{} must be greater than zero",
            new_name
        ))));
    }
    Ok(value)
}

/// `true/1/yes/on` を真として解釈する
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// base64文字列からフィールド暗号鍵をデコードする
///
/// 32バイトでない鍵はエラー。鍵の再生成は行わない（既存の暗号文が読めなくなるため）。
pub fn decode_encryption_key(encoded: &str) -> Result<[u8; ENCRYPTION_KEY_LEN], GlrError> {
    let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
        GlrError::Common(CommonError::Config(format!(
            "encryption key is not valid base64: {}",
            e
        )))
    })?;
    <[u8; ENCRYPTION_KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        GlrError::Common(CommonError::Config(format!(
            "encryption key must decode to {} bytes, got {}",
            ENCRYPTION_KEY_LEN,
            bytes.len()
        )))
    })
}

/// Process-wide configuration
#[derive(Clone)]
pub struct AppConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Directory holding persisted evidence bundles
    pub evidence_dir: PathBuf,
    /// Directory for spooled uploads
    pub spool_dir: PathBuf,
    /// Field encryption key
    pub encryption_key: [u8; ENCRYPTION_KEY_LEN],
    /// HS256 signing secret
    pub jwt_secret: String,
    /// What to do when a referenced evidence file is gone
    pub missing_evidence: MissingEvidencePolicy,
    /// Upper bound for a single evidence file
    pub max_file_bytes: u64,
    /// Upper bound for a whole request body
    pub max_request_bytes: usize,
    /// Apply migrations when the server starts
    pub auto_migrate: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("evidence_dir", &self.evidence_dir)
            .field("spool_dir", &self.spool_dir)
            .field("encryption_key", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("missing_evidence", &self.missing_evidence)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("max_request_bytes", &self.max_request_bytes)
            .field("auto_migrate", &self.auto_migrate)
            .finish()
    }
}

impl AppConfig {
    /// Load and validate configuration from environment variables.
    ///
    /// Fails fast on a missing or malformed encryption key or JWT secret, and on
    /// any set variable whose value does not parse.
    pub fn from_env() -> Result<Self, GlrError> {
        let host = get_env_with_fallback_or("GLRCHAIN_HOST", "HOST", "0.0.0.0");
        let port = get_env_with_fallback_parse("GLRCHAIN_PORT", "PORT", 8000u16)?;
        let database_url = get_env_with_fallback_or(
            "GLRCHAIN_DATABASE_URL",
            "DATABASE_URL",
            "sqlite:data/glrchain.db",
        );
        let evidence_dir = PathBuf::from(get_env_with_fallback_or(
            "GLRCHAIN_EVIDENCE_DIR",
            "EVIDENCE_DIR",
            "data/evidence",
        ));
        let spool_dir = get_env_with_fallback("GLRCHAIN_SPOOL_DIR", "SPOOL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let encoded_key = get_env_with_fallback("GLRCHAIN_ENCRYPTION_KEY", "SECRET_KEY")
            .ok_or_else(|| {
                GlrError::Common(CommonError::Config(
                    "GLRCHAIN_ENCRYPTION_KEY is not set (generate one with `glrchain keygen`)"
                        .to_string(),
                ))
            })?;
        let encryption_key = decode_encryption_key(&encoded_key)?;

        let jwt_secret = get_env_with_fallback("GLRCHAIN_JWT_SECRET", "JWT_SECRET")
            .ok_or_else(|| {
                GlrError::Common(CommonError::Config(
                    "GLRCHAIN_JWT_SECRET is not set".to_string(),
                ))
            })?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(GlrError::Common(CommonError::Config(format!(
                "GLRCHAIN_JWT_SECRET must be at least {} bytes",
                MIN_JWT_SECRET_LEN
            ))));
        }

        let missing_evidence = match get_env_with_fallback(
            "GLRCHAIN_MISSING_EVIDENCE",
            "MISSING_EVIDENCE",
        ) {
            Some(raw) => raw.parse::<MissingEvidencePolicy>()?,
            None => MissingEvidencePolicy::default(),
        };

        let max_file_bytes = get_env_limit(
            "GLRCHAIN_MAX_FILE_BYTES",
            "MAX_FILE_BYTES",
            DEFAULT_MAX_FILE_BYTES,
        )?;
        let max_request_bytes = get_env_limit(
            "GLRCHAIN_MAX_REQUEST_BYTES",
            "MAX_REQUEST_BYTES",
            DEFAULT_MAX_REQUEST_BYTES,
        )?;
        let auto_migrate = get_env_flag("GLRCHAIN_AUTO_MIGRATE", "AUTO_MIGRATE", true)?;

        Ok(Self {
            host,
            port,
            database_url,
            evidence_dir,
            spool_dir,
            encryption_key,
            jwt_secret,
            missing_evidence,
            max_file_bytes,
            max_request_bytes,
            auto_migrate,
        })
    }

    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
