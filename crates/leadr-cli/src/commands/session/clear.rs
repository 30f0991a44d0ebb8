//! Session clear command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::ClientArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct ClearArgs {}

pub fn run(_args: ClearArgs, client: &ClientArgs) -> Result<()> {
    let tokens = storage::open_tokens(client.store.as_deref())?;
    tokens.clear_tokens();
    output::success("Session cleared");
    Ok(())
}
