//! Single-flight coordination for token refresh.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::types::Session;

/// Outcome of one refresh, shared by every caller that joined it.
pub type SharedRefresh = Arc<AuthResult<Session>>;

#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: Vec<oneshot::Sender<SharedRefresh>>,
}

/// Ensures at most one refresh is in flight.
///
/// The first caller runs the refresh. Callers arriving while it runs park on
/// a oneshot and receive the very same [`SharedRefresh`] when it finishes.
/// Completion drains the waiter list and clears `in_progress` under one lock,
/// so the next caller after that starts a new cycle.
#[derive(Default)]
pub struct RefreshGate {
    state: Mutex<RefreshState>,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh is currently running.
    pub fn in_progress(&self) -> bool {
        self.state().in_progress
    }

    /// Number of callers parked on the running refresh.
    pub fn waiting(&self) -> usize {
        self.state().waiters.len()
    }

    /// Run `refresh`, or join the one already running.
    pub async fn run<F, Fut>(&self, refresh: F) -> SharedRefresh
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AuthResult<Session>>,
    {
        let joined = {
            let mut state = self.state();
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.in_progress = true;
                None
            }
        };

        if let Some(rx) = joined {
            debug!("Joining in-flight refresh");
            return rx.await.unwrap_or_else(|_| {
                Arc::new(Err(AuthError::network(
                    "Refresh was abandoned before completing",
                )))
            });
        }

        let flight = Flight {
            gate: self,
            landed: false,
        };
        let outcome = Arc::new(refresh().await);
        flight.land(&outcome);
        outcome
    }
}

/// Leader's hold on the gate. Dropping it without landing (the leader's
/// future was dropped mid-refresh) reopens the gate and releases the waiters.
struct Flight<'a> {
    gate: &'a RefreshGate,
    landed: bool,
}

impl Flight<'_> {
    fn land(mut self, outcome: &SharedRefresh) {
        let waiters = self.release();
        self.landed = true;
        debug!(waiters = waiters.len(), "Refresh finished, notifying waiters");
        for waiter in waiters {
            // Err only means that waiter stopped listening.
            let _ = waiter.send(Arc::clone(outcome));
        }
    }

    fn release(&self) -> Vec<oneshot::Sender<SharedRefresh>> {
        let mut state = self.gate.state();
        state.in_progress = false;
        std::mem::take(&mut state.waiters)
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.landed {
            self.release();
        }
    }
}
