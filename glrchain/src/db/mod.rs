//! データベースアクセス層
//!
//! SQLiteベースのデータ永続化

/// ユーザー管理
pub mod users;

/// インシデント
pub mod incidents;

/// テキスト通報
pub mod reports;

/// データベースマイグレーション
pub mod migrations;
