//! GLRChain incident backend entry point

use clap::Parser;
use glrchain::cli::{serve::ServeArgs, Cli, Commands};
use glrchain::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Keygen) => {
            glrchain::cli::keygen::execute();
        }
        Some(Commands::Verify(args)) => {
            match glrchain::cli::verify::execute(&args).await {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    std::process::exit(2);
                }
            }
        }
        Some(Commands::Migrate(args)) => {
            let _guard = init_logging();
            if let Err(e) = glrchain::cli::migrate::execute(&args).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve(args)) => run_server(&args).await,
        None => run_server(&ServeArgs::default()).await,
    }
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    match logging::init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run_server(args: &ServeArgs) {
    let _guard = init_logging();
    if let Err(e) = glrchain::cli::serve::execute(args).await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
