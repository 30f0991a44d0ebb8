//! Subcommand implementations.

pub mod fingerprint;
pub mod nonce;
pub mod request;
pub mod session;

use anyhow::{Context, Result};

use leadr::{ApiUrl, ClientConfig, LeadrClient};

use crate::cli::ClientArgs;
use crate::storage;

/// Build a client backed by the on-disk credential store.
pub fn client(args: &ClientArgs) -> Result<LeadrClient> {
    let api_url = args
        .api_url
        .as_deref()
        .context("No API URL. Pass --api-url or set LEADR_API_URL.")?;
    let game_id = args
        .game_id
        .as_deref()
        .context("No game ID. Pass --game-id or set LEADR_GAME_ID.")?;

    let api_url = ApiUrl::new(api_url).context("Invalid API URL")?;
    let mut config = ClientConfig::new(api_url, game_id);
    if let Some(platform) = &args.platform {
        config = config.with_platform(platform);
    }

    LeadrClient::builder(config)
        .store(storage::open_store(args.store.as_deref())?)
        .build()
        .context("Failed to initialize client")
}
