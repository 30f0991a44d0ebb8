//! Session show command implementation.

use anyhow::Result;
use chrono::DateTime;
use clap::Args;
use serde::Serialize;

use crate::cli::ClientArgs;
use crate::output;
use crate::storage;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    has_token: bool,
    expires_at: Option<String>,
    expires_in: i64,
    expired: bool,
    fingerprint: String,
}

pub fn run(args: ShowArgs, client: &ClientArgs) -> Result<()> {
    let tokens = storage::open_tokens(client.store.as_deref())?;

    let status = SessionStatus {
        has_token: tokens.has_token(),
        expires_at: DateTime::from_timestamp(tokens.get_expires_at(), 0)
            .filter(|_| tokens.has_token())
            .map(|at| at.to_rfc3339()),
        expires_in: tokens.expires_in_seconds(),
        expired: tokens.is_expired(),
        fingerprint: tokens.get_or_generate_fingerprint(),
    };

    if args.json {
        return output::json(&status);
    }

    if !status.has_token {
        output::error("No active session");
        output::field("Fingerprint", &status.fingerprint);
        return Ok(());
    }

    output::field("Expires at", status.expires_at.as_deref().unwrap_or("-"));
    if status.expired {
        output::field("Expires in", "expired");
    } else {
        output::field("Expires in", &format!("{}s", status.expires_in));
    }
    output::field("Fingerprint", &status.fingerprint);

    Ok(())
}
