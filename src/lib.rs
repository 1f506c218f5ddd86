pub mod api; // OPD REST gateway
pub mod cli;
pub mod config;
pub mod desk; // Admin / reception / doctor orchestration
pub mod models;
pub mod prescription_pdf; // Prescription document composer
pub mod roster; // Date-then-doctor patient grouping
pub mod session;
pub mod validation;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    // Initialize tracing (stderr, so listings on stdout stay clean)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} v{} starting", config::APP_NAME, config::APP_VERSION);

    let cli = cli::Cli::parse();
    cli::run(cli)
}
