//! Error types for the leadr library.
//!
//! Every authenticated operation reports failure through [`AuthError`], a flat
//! status/code/message triple that mirrors what the service puts on the wire.
//! Lower layers (transport, persistence, configuration) have their own enums
//! and are folded into an `AuthError` or the crate-wide [`Error`] at the seam.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result type for authenticated operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Maximum number of characters of a raw response body carried in an
/// `unknown` error message.
const MAX_RAW_BODY_CHARS: usize = 200;

/// Well-known error codes produced locally by the client.
pub mod codes {
    /// The transport could not complete the exchange.
    pub const NETWORK_ERROR: &str = "network_error";
    /// A refresh was attempted with no stored refresh token.
    pub const NO_REFRESH_TOKEN: &str = "no_refresh_token";
    /// The response body was not valid JSON or lacked the expected shape.
    pub const PARSE_ERROR: &str = "parse_error";
    /// A mutation nonce could not be obtained.
    pub const NONCE_ERROR: &str = "nonce_error";
    /// The service returned a plain error message.
    pub const API_ERROR: &str = "api_error";
    /// The service rejected the request payload.
    pub const VALIDATION_ERROR: &str = "validation_error";
    /// The error body could not be interpreted.
    pub const UNKNOWN: &str = "unknown";
}

/// A terminal failure of an authenticated operation.
///
/// `status_code` is the HTTP status when the failure came from the service,
/// and `0` for network and other local failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    /// HTTP status code, or 0 when no response was involved.
    pub status_code: u16,
    /// Symbolic error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status_code != 0 {
            write!(f, "HTTP {} ", self.status_code)?;
        }
        write!(f, "[{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Create a new error.
    pub fn new(status_code: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, codes::NETWORK_ERROR, message)
    }

    pub fn no_refresh_token() -> Self {
        Self::new(401, codes::NO_REFRESH_TOKEN, "No refresh token available")
    }

    pub fn parse(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(status_code, codes::PARSE_ERROR, message)
    }

    pub fn nonce(status_code: u16) -> Self {
        Self::new(status_code, codes::NONCE_ERROR, "Failed to obtain nonce")
    }

    /// Returns true if this error carries the given code.
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// Build an error from a non-2xx response body.
    ///
    /// The body is probed for the error shapes the service and its framework
    /// emit, in order:
    ///
    /// 1. `{"error": "<string>"}`
    /// 2. `{"error": {"code": "...", "message": "..."}}`
    /// 3. `{"detail": "<string>"}` or `{"detail": [{"msg": "..."}]}`
    /// 4. `{"message": "<string>"}`
    ///
    /// Anything else becomes `unknown` with a prefix of the raw body.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        if text.trim().is_empty() {
            return Self::new(status_code, codes::UNKNOWN, "Unknown error (empty response)");
        }

        let parsed = serde_json::from_str::<Value>(&text).ok();
        if let Some(Value::Object(map)) = &parsed {
            match map.get("error") {
                Some(Value::String(message)) => {
                    return Self::new(status_code, codes::API_ERROR, message.clone());
                }
                Some(Value::Object(error)) => {
                    let code = error
                        .get("code")
                        .and_then(Value::as_str)
                        .unwrap_or(codes::API_ERROR);
                    let message = error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown error");
                    return Self::new(status_code, code, message);
                }
                _ => {}
            }

            match map.get("detail") {
                Some(Value::String(message)) => {
                    return Self::new(status_code, codes::API_ERROR, message.clone());
                }
                Some(Value::Array(items)) if !items.is_empty() => {
                    let messages: Vec<&str> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(Value::as_str))
                        .collect();
                    let message = if messages.is_empty() {
                        "Validation error".to_string()
                    } else {
                        messages.join("; ")
                    };
                    return Self::new(status_code, codes::VALIDATION_ERROR, message);
                }
                _ => {}
            }

            if let Some(Value::String(message)) = map.get("message") {
                return Self::new(status_code, codes::API_ERROR, message.clone());
            }
        }

        let raw: String = text.chars().take(MAX_RAW_BODY_CHARS).collect();
        Self::new(status_code, codes::UNKNOWN, raw)
    }
}

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        AuthError::network(err.to_string())
    }
}

/// Crate-wide error for construction and configuration failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Credential persistence failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Network transport could not be set up.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

/// Key/value persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt store contents: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A required setting was not provided.
    #[error("missing setting: {name}")]
    Missing { name: &'static str },

    /// A setting had an unusable value.
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
