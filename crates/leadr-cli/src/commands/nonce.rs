//! Nonce command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use tracing::warn;

use crate::cli::ClientArgs;

#[derive(Args, Debug)]
pub struct NonceArgs {}

pub async fn run(_args: NonceArgs, args: &ClientArgs) -> Result<()> {
    let client = super::client(args)?;

    if !client.token_store().has_token() {
        eprintln!("{}", "No session, starting one...".dimmed());
        client
            .start_session()
            .await
            .context("Failed to start session")?;
    }

    let Some(nonce) = client.get_nonce().await else {
        warn!("Nonce endpoint returned no usable nonce");
        bail!("Failed to obtain nonce");
    };

    println!("{}", nonce);
    Ok(())
}
