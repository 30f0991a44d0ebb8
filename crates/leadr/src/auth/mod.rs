//! Session lifecycle and authenticated request handling.
//!
//! [`AuthCoordinator`] is the entry point: it starts and refreshes sessions
//! through [`SessionClient`], fetches nonces through [`NonceProvider`] and
//! retries requests that fail with 401 or 412. Refreshes are single-flighted
//! by [`RefreshGate`].

mod coordinator;
mod events;
mod nonce;
mod refresh;
mod session_client;

pub use coordinator::AuthCoordinator;
pub use events::{AuthEvent, EventBus};
pub use nonce::NonceProvider;
pub use refresh::{RefreshGate, SharedRefresh};
pub use session_client::SessionClient;
