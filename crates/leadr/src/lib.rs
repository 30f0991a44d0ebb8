//! leadr - Client library for the LEADR leaderboard service
//!
//! This library manages anonymous device sessions and authenticated calls
//! against the LEADR client API. All authenticated operations flow through a
//! [`LeadrClient`], which starts a session on first use, refreshes tokens
//! before they expire, retries once on `401`, and attaches single-use nonces
//! to mutating requests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use leadr::{ApiUrl, ClientConfig, FileStore, LeadrClient};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new(ApiUrl::new("https://api.leadr.gg")?, "gam_123");
//! let client = LeadrClient::builder(config)
//!     .store(Arc::new(FileStore::new("credentials.json")))
//!     .build()?;
//!
//! let score = client
//!     .post("/v1/client/scores", json!({"board_id": "brd_1", "value": 42}), true)
//!     .await?;
//! println!("{}", score);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod types;

mod client;

#[cfg(test)]
mod testing;

// Re-export primary types at crate root for convenience
pub use auth::AuthEvent;
pub use client::{LeadrClient, LeadrClientBuilder};
pub use config::ClientConfig;
pub use error::{AuthError, AuthResult, Error};
pub use store::{FileStore, KeyValueStore, MemoryStore, TokenStore};
pub use types::{AccessToken, ApiUrl, RefreshToken, Session};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
