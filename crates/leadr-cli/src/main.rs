//! leadr - CLI tool for exercising the LEADR client session layer.
//!
//! This is a thin wrapper over the `leadr` library, intended for manual
//! testing of device sessions, token refresh and nonces against a LEADR
//! deployment.

mod cli;
mod commands;
mod output;
mod storage;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{fingerprint, nonce, request, session};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Session(cmd) => session::handle(cmd, &cli.client).await,
        Commands::Nonce(args) => nonce::run(args, &cli.client).await,
        Commands::Fingerprint(args) => fingerprint::run(args, &cli.client),
        Commands::Request(args) => request::run(args, &cli.client).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
