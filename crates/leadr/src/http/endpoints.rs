//! Endpoint paths and request/response bodies of the client API.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Creates an anonymous device session. Unauthenticated.
pub const CREATE_SESSION: &str = "/v1/client/sessions";

/// Exchanges a refresh token for a new token pair.
pub const REFRESH_SESSION: &str = "/v1/client/sessions/refresh";

/// Issues a one-time mutation nonce.
pub const GET_NONCE: &str = "/v1/client/nonce";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for session creation.
#[derive(Debug, Serialize)]
pub struct CreateSessionRequest<'a> {
    pub game_id: &'a str,
    pub client_fingerprint: &'a str,
    pub platform: &'a str,
}

/// Response from the nonce endpoint.
#[derive(Debug, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}
