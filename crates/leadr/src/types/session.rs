//! Session payload returned by the session and refresh endpoints.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::tokens::{AccessToken, RefreshToken};

/// Keys a session object may be nested under.
const ENVELOPE_KEYS: [&str; 2] = ["session", "data"];

/// An anonymous, device-bound identity session.
///
/// Sessions are handed back to the caller and announced to subscribers; the
/// client itself only keeps the token fields, in the
/// [`TokenStore`](crate::TokenStore).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub client_fingerprint: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(deserialize_with = "whole_seconds")]
    pub expires_in: i64,
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

/// Accept `3600` as well as `3600.0`. Fractional values are rejected and
/// out-of-range values saturate.
fn whole_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(seconds) = number.as_i64() {
        return Ok(seconds);
    }
    if number.is_u64() {
        return Ok(i64::MAX);
    }
    match number.as_f64() {
        Some(seconds) if seconds.is_finite() && seconds.fract() == 0.0 => Ok(seconds as i64),
        _ => Err(D::Error::custom(format!(
            "expires_in must be a whole number of seconds, got {}",
            number
        ))),
    }
}

impl Session {
    /// Parse a session from a response document.
    ///
    /// Accepts the fields at the top level, or nested one level under
    /// `session` or `data`. Returns `None` if no object with the required
    /// token fields is found.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.contains_key("access_token") {
            return serde_json::from_value(value.clone()).ok();
        }
        ENVELOPE_KEYS
            .iter()
            .filter_map(|key| object.get(*key))
            .find(|inner| inner.get("access_token").is_some())
            .and_then(|inner| serde_json::from_value(inner.clone()).ok())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("device_id", &self.device_id)
            .field("account_id", &self.account_id)
            .field("platform", &self.platform)
            .field("status", &self.status)
            .field("expires_in", &self.expires_in)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
