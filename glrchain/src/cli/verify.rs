//! verify サブコマンド
//!
//! 保存済み証拠バンドルの完全性を検証します。

use crate::evidence::verify_bundle_file;
use clap::Args;
use std::path::PathBuf;

/// verify サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Bundle files (evidence_<sha256>.json)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

/// 各ファイルを検証して結果を表示する
///
/// すべて有効なら `Ok(true)`。
pub async fn execute(args: &VerifyArgs) -> anyhow::Result<bool> {
    let mut all_valid = true;

    for path in &args.paths {
        match verify_bundle_file(path).await {
            Ok(report) if report.valid => {
                println!("OK       {} ({})", path.display(), report.actual_digest);
            }
            Ok(report) => {
                all_valid = false;
                let reason = if !report.canonical {
                    "not in canonical form".to_string()
                } else {
                    match &report.expected_digest {
                        Some(expected) => format!(
                            "digest mismatch: name says {}, content is {}",
                            expected, report.actual_digest
                        ),
                        None => format!(
                            "file name carries no digest; content is {}",
                            report.actual_digest
                        ),
                    }
                };
                println!("INVALID  {} ({})", path.display(), reason);
            }
            Err(e) => {
                all_valid = false;
                println!("ERROR    {} ({})", path.display(), e);
            }
        }
    }

    Ok(all_valid)
}
