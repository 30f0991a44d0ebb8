//! Persisted access/refresh token state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::types::{AccessToken, RefreshToken};

use super::{FingerprintSource, KeyValueStore};

const CREDENTIALS_KEY: &str = "credentials";
const FINGERPRINT_KEY: &str = "fingerprint";

/// Snapshot of the persisted credential state.
///
/// `expires_at` is an absolute Unix timestamp in seconds; `0` means unknown
/// and is always treated as expired.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: RefreshToken,
    #[serde(default)]
    pub expires_at: i64,
    /// Persisted under its own key so it outlives [`TokenStore::clear_tokens`].
    #[serde(skip)]
    pub fingerprint: String,
}

/// Process-wide credential state.
///
/// Reads are served from an in-memory mirror; every mutation is written
/// through to the backing [`KeyValueStore`] while the mirror is locked, so
/// memory and storage agree on the last writer. Token fields are stored as a
/// single record, which makes [`save_tokens`](Self::save_tokens) atomic.
///
/// Backing-store failures are logged and otherwise ignored: a client that
/// cannot persist keeps working for the lifetime of the process.
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    fingerprinter: Arc<dyn FingerprintSource>,
    credentials_key: String,
    fingerprint_key: String,
    state: Mutex<StoredCredentials>,
}

impl TokenStore {
    /// Load credential state from `backend`, with keys prefixed by `namespace`.
    pub fn load(
        backend: Arc<dyn KeyValueStore>,
        namespace: &str,
        clock: Arc<dyn Clock>,
        fingerprinter: Arc<dyn FingerprintSource>,
    ) -> Self {
        let credentials_key = format!("{}.{}", namespace, CREDENTIALS_KEY);
        let fingerprint_key = format!("{}.{}", namespace, FINGERPRINT_KEY);

        let mut credentials = match backend.get(&credentials_key) {
            Ok(Some(json)) => serde_json::from_str::<StoredCredentials>(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable stored credentials");
                StoredCredentials::default()
            }),
            Ok(None) => StoredCredentials::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored credentials");
                StoredCredentials::default()
            }
        };

        credentials.fingerprint = match backend.get(&fingerprint_key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read stored fingerprint");
                String::new()
            }
        };

        Self {
            backend,
            clock,
            fingerprinter,
            credentials_key,
            fingerprint_key,
            state: Mutex::new(credentials),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoredCredentials> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current credential snapshot.
    pub fn credentials(&self) -> StoredCredentials {
        self.state().clone()
    }

    pub fn get_access_token(&self) -> AccessToken {
        self.state().access_token.clone()
    }

    pub fn get_refresh_token(&self) -> RefreshToken {
        self.state().refresh_token.clone()
    }

    /// Absolute expiry as Unix seconds, `0` if unknown.
    pub fn get_expires_at(&self) -> i64 {
        self.state().expires_at
    }

    /// True iff an access token is stored.
    pub fn has_token(&self) -> bool {
        !self.state().access_token.is_empty()
    }

    /// True iff the expiry is unknown or at most `threshold_seconds` away.
    pub fn is_expiring_soon(&self, threshold_seconds: i64) -> bool {
        let expires_at = self.get_expires_at();
        expires_at == 0 || expires_at.saturating_sub(self.clock.now()) <= threshold_seconds
    }

    /// True iff the expiry is unknown or has passed.
    pub fn is_expired(&self) -> bool {
        let expires_at = self.get_expires_at();
        expires_at == 0 || self.clock.now() >= expires_at
    }

    /// Seconds until expiry, clamped at zero.
    pub fn expires_in_seconds(&self) -> i64 {
        let expires_at = self.get_expires_at();
        if expires_at == 0 {
            return 0;
        }
        expires_at.saturating_sub(self.clock.now()).max(0)
    }

    /// Store a new token pair that expires `expires_in_seconds` from now.
    pub fn save_tokens(
        &self,
        access_token: AccessToken,
        refresh_token: RefreshToken,
        expires_in_seconds: i64,
    ) {
        let mut state = self.state();
        let updated = StoredCredentials {
            access_token,
            refresh_token,
            expires_at: self.clock.now().saturating_add(expires_in_seconds),
            fingerprint: state.fingerprint.clone(),
        };

        match serde_json::to_string(&updated) {
            Ok(json) => {
                if let Err(e) = self.backend.set(&self.credentials_key, &json) {
                    warn!(error = %e, "Failed to persist tokens");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize tokens"),
        }

        debug!(expires_at = updated.expires_at, "Tokens saved");
        *state = updated;
    }

    /// Forget the token pair and expiry. The fingerprint is kept.
    pub fn clear_tokens(&self) {
        let mut state = self.state();
        if let Err(e) = self.backend.remove(&self.credentials_key) {
            warn!(error = %e, "Failed to remove persisted tokens");
        }
        state.access_token = AccessToken::default();
        state.refresh_token = RefreshToken::default();
        state.expires_at = 0;
        debug!("Tokens cleared");
    }

    /// Return the device fingerprint, generating and persisting it on first use.
    pub fn get_or_generate_fingerprint(&self) -> String {
        let mut state = self.state();
        if !state.fingerprint.is_empty() {
            return state.fingerprint.clone();
        }

        let fingerprint = self.fingerprinter.fingerprint();
        if let Err(e) = self.backend.set(&self.fingerprint_key, &fingerprint) {
            warn!(error = %e, "Failed to persist fingerprint");
        }
        debug!("Generated device fingerprint");
        state.fingerprint = fingerprint.clone();
        fingerprint
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("namespace_key", &self.credentials_key)
            .field("credentials", &*self.state())
            .finish()
    }
}
