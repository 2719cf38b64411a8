//! 証拠パッケージング
//!
//! アップロードされた証拠ファイルのダイジェスト計算、正規化バンドルの生成、
//! 内容アドレスでの永続化を担う。

pub mod bundle;
pub mod digest;
pub mod packager;
pub mod spool;

pub use bundle::{EvidenceBundle, EvidenceFileRecord, IncidentMetadata};
pub use digest::{is_sha256_hex, sha256_hex, StreamingDigest};
pub use packager::{
    verify_bundle_file, BundleVerification, EvidencePackager, EvidenceSource,
    MissingEvidencePolicy, PackagedEvidence,
};
pub use spool::{sanitize_file_name, SpooledFile, SpooledUpload, UploadSpool};
