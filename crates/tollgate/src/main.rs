// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binary entry point for the `tollgate` CLI.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tollgate::cli::{self, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match tollgate_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tollgate: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &config).await {
        eprintln!("tollgate: {e}");
        std::process::exit(1);
    }
}
