//! serve サブコマンド
//!
//! HTTPサーバーを起動します。

use crate::config::AppConfig;
use clap::Args;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Listen port (overrides GLRCHAIN_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address (overrides GLRCHAIN_HOST)
    #[arg(short = 'H', long)]
    pub host: Option<String>,
}

impl ServeArgs {
    /// コマンドライン指定を設定に反映する
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }
}

/// 設定を読み込みサーバーを起動する
pub async fn execute(args: &ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    args.apply(&mut config);
    crate::server::serve(config).await
}
