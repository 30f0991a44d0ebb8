//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::fingerprint::FingerprintArgs;
use crate::commands::nonce::NonceArgs;
use crate::commands::request::RequestArgs;
use crate::commands::session::SessionCommand;

/// LEADR client CLI for session and nonce testing.
#[derive(Parser, Debug)]
#[command(name = "leadr")]
#[command(author, version = env!("LEADR_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub client: ClientArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and storage settings shared by all commands.
#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the LEADR API
    #[arg(long, env = "LEADR_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Game ID sessions are created for
    #[arg(long, env = "LEADR_GAME_ID", global = true)]
    pub game_id: Option<String>,

    /// Platform reported when starting a session
    #[arg(long, env = "LEADR_PLATFORM", global = true)]
    pub platform: Option<String>,

    /// Credential store file (defaults to the user data directory)
    #[arg(long, env = "LEADR_STORE", global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Device session operations
    Session(SessionCommand),

    /// Fetch a one-time nonce
    Nonce(NonceArgs),

    /// Print this device's fingerprint
    Fingerprint(FingerprintArgs),

    /// Send an authenticated request
    Request(RequestArgs),
}
