//! keygen サブコマンド

/// 新しいフィールド暗号鍵を標準出力に表示する
pub fn execute() {
    println!("{}", crate::crypto::generate_key());
}
