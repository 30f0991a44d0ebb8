//! Session subcommand implementations.

mod clear;
mod refresh;
mod show;
mod start;

use anyhow::Result;
use clap::{Args, Subcommand};

use leadr::Session;

use crate::cli::ClientArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct SessionCommand {
    #[command(subcommand)]
    pub command: SessionSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SessionSubcommand {
    /// Start a new device session
    Start(start::StartArgs),

    /// Refresh the stored session
    Refresh(refresh::RefreshArgs),

    /// Show the stored credentials
    Show(show::ShowArgs),

    /// Forget the stored tokens
    Clear(clear::ClearArgs),
}

pub async fn handle(cmd: SessionCommand, client: &ClientArgs) -> Result<()> {
    match cmd.command {
        SessionSubcommand::Start(args) => start::run(args, client).await,
        SessionSubcommand::Refresh(args) => refresh::run(args, client).await,
        SessionSubcommand::Show(args) => show::run(args, client),
        SessionSubcommand::Clear(args) => clear::run(args, client),
    }
}

fn print_session(session: &Session) {
    if let Some(id) = &session.id {
        output::field("Session", id);
    }
    if let Some(device) = &session.device_id {
        output::field("Device", device);
    }
    if let Some(account) = &session.account_id {
        output::field("Account", account);
    }
    if let Some(status) = &session.status {
        output::field("Status", status);
    }
    output::field("Expires in", &format!("{}s", session.expires_in));
}
