//! CLI module for glrchain
//!
//! Provides the command-line interface for the incident backend.

pub mod keygen;
pub mod migrate;
pub mod serve;
pub mod verify;

use clap::{Parser, Subcommand};

/// GLRChain incident backend - tamper-evident evidence intake for illegal mining reports
#[derive(Parser, Debug)]
#[command(name = "glrchain")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    GLRCHAIN_HOST                Bind address (default: 0.0.0.0)
    GLRCHAIN_PORT                Listen port (default: 8000)
    GLRCHAIN_DATABASE_URL        Database URL (default: sqlite:data/glrchain.db)
    GLRCHAIN_EVIDENCE_DIR        Evidence bundle directory (default: data/evidence)
    GLRCHAIN_SPOOL_DIR           Upload spool directory (default: system temp dir)
    GLRCHAIN_ENCRYPTION_KEY      Base64 32-byte field encryption key (required)
    GLRCHAIN_JWT_SECRET          JWT signing key, at least 16 bytes (required)
    GLRCHAIN_MISSING_EVIDENCE    skip | fail (default: skip)
    GLRCHAIN_MAX_FILE_BYTES      Per-file upload limit (default: 25 MiB)
    GLRCHAIN_MAX_REQUEST_BYTES   Per-request body limit (default: 100 MiB)
    GLRCHAIN_AUTO_MIGRATE        Apply migrations on serve (default: true)
    GLRCHAIN_LOG_LEVEL           Log filter (default: info)
    GLRCHAIN_LOG_DIR             Directory for daily rolling log files
"#)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),
    /// Apply database migrations and exit
    Migrate(migrate::MigrateArgs),
    /// Check the integrity of persisted evidence bundles
    Verify(verify::VerifyArgs),
    /// Print a fresh base64 field encryption key
    Keygen,
}
