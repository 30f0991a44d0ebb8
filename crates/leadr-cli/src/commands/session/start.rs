//! Session start command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::cli::ClientArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct StartArgs {}

pub async fn run(_args: StartArgs, args: &ClientArgs) -> Result<()> {
    let client = crate::commands::client(args)?;

    eprintln!("{}", "Starting session...".dimmed());

    let session = client
        .start_session()
        .await
        .context("Failed to start session")?;

    output::success("Session started");
    println!();
    super::print_session(&session);

    Ok(())
}
