use clap::Parser;
use live_catalog::cli::{self, Cli};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    live_catalog::init_logging();

    let cli = Cli::parse();
    match cli::run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            std::process::ExitCode::FAILURE
        }
    }
}
