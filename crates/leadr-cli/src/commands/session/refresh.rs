//! Session refresh command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use crate::cli::ClientArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, args: &ClientArgs) -> Result<()> {
    let client = crate::commands::client(args)?;
    if client.token_store().get_refresh_token().is_empty() {
        bail!("No active session. Run 'leadr session start' first.");
    }

    eprintln!("{}", "Refreshing session...".dimmed());

    let session = client
        .refresh_session()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed");
    super::print_session(&session);

    Ok(())
}
