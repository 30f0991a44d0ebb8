//! Fingerprint command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::ClientArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct FingerprintArgs {}

pub fn run(_args: FingerprintArgs, client: &ClientArgs) -> Result<()> {
    let tokens = storage::open_tokens(client.store.as_deref())?;
    println!("{}", tokens.get_or_generate_fingerprint());
    output::hint("The fingerprint is kept when the session is cleared.");
    Ok(())
}
