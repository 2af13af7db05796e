use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use fiscalbook_lib::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli);

    tracing::debug!("fiscalbook v{} starting", env!("CARGO_PKG_VERSION"));

    match fiscalbook_lib::run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise the level comes from `--verbose` / `--quiet`
fn init_logging(cli: &Cli) {
    let level = cli.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fiscalbook_lib={0},fiscalbook={0}", level)));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
