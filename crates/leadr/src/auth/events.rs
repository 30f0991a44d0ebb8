//! Session lifecycle notifications.

use tokio::sync::broadcast;

use crate::error::AuthError;
use crate::types::Session;

const CHANNEL_CAPACITY: usize = 32;

/// Something subscribers may want to react to.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A session was created or refreshed and its tokens stored.
    SessionChanged(Session),
    /// Authentication broke down and could not be recovered by refreshing
    /// or starting a new session.
    AuthFailed(AuthError),
}

/// Fan-out of [`AuthEvent`]s. Emitting with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AuthEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AuthEvent) {
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
