//! axumサーバー起動・シャットダウンハンドリング

use crate::config::AppConfig;
use crate::AppState;
use anyhow::Context;
use tracing::info;

/// 設定に従ってDBを初期化し、サーバーを起動する
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let db_pool = crate::db::migrations::initialize_database(
        &config.database_url,
        config.auto_migrate,
    )
    .await
    .context("failed to initialize database")?;

    std::fs::create_dir_all(&config.evidence_dir).with_context(|| {
        format!(
            "failed to create evidence directory {}",
            config.evidence_dir.display()
        )
    })?;

    tokio::task::spawn_blocking(crate::auth::password::warm_dummy_hash)
        .await
        .context("password hashing task failed")?
        .context("failed to prepare login hash")?;

    info!(config = ?config, "Configuration loaded");
    let bind_addr = config.bind_addr();
    run(AppState::new(config, db_pool), &bind_addr).await
}

/// axumサーバーを起動し、シャットダウンシグナルを待機する
pub async fn run(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let db_pool = state.db_pool.clone();
    let app = crate::api::create_app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", bind_addr))?;

    info!("GLRChain backend listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db_pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
