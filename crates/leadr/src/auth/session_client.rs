//! Session creation and refresh against the identity endpoints.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, AuthResult};
use crate::http::{
    AUTHORIZATION_HEADER, CREATE_SESSION, CreateSessionRequest, HttpRequest, HttpResponse, Method,
    REFRESH_SESSION, Transport,
};
use crate::store::TokenStore;
use crate::types::{ApiUrl, Session};

use super::events::{AuthEvent, EventBus};

/// Creates and refreshes device sessions and records their tokens.
///
/// [`refresh_token`](Self::refresh_token) is not single-flighted here; go
/// through [`AuthCoordinator::refresh_token`](super::AuthCoordinator::refresh_token)
/// when other callers may be refreshing at the same time.
#[derive(Clone)]
pub struct SessionClient {
    api_url: ApiUrl,
    game_id: String,
    platform: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    events: EventBus,
}

impl SessionClient {
    pub fn new(
        api_url: ApiUrl,
        game_id: impl Into<String>,
        platform: impl Into<String>,
        transport: Arc<dyn Transport>,
        tokens: Arc<TokenStore>,
        events: EventBus,
    ) -> Self {
        Self {
            api_url,
            game_id: game_id.into(),
            platform: platform.into(),
            transport,
            tokens,
            events,
        }
    }

    /// Start a new anonymous session for this device.
    ///
    /// On success the tokens are stored and a
    /// [`SessionChanged`](AuthEvent::SessionChanged) event is emitted.
    #[instrument(skip(self), fields(game_id = %self.game_id, platform = %self.platform))]
    pub async fn start_session(&self) -> AuthResult<Session> {
        info!("Starting session");

        let fingerprint = self.tokens.get_or_generate_fingerprint();
        let body = CreateSessionRequest {
            game_id: &self.game_id,
            client_fingerprint: &fingerprint,
            platform: &self.platform,
        };
        let body = serde_json::to_value(&body).map_err(|e| AuthError::parse(0, e.to_string()))?;

        let request = HttpRequest::new(Method::Post, self.api_url.endpoint(CREATE_SESSION)).json(&body);
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "Session request failed");
            AuthError::from(e)
        })?;

        if !response.is_success() {
            let error = AuthError::from_response(response.status, &response.body);
            warn!(status = response.status, code = %error.code, "Session rejected");
            return Err(error);
        }

        let session = Self::parse_session(&response)?;
        self.store(&session);
        debug!(session_id = ?session.id, "Session started");
        Ok(session)
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// Fails with `no_refresh_token` without touching the network when no
    /// refresh token is stored. If the service rejects the refresh, all stored
    /// tokens are cleared so the next call starts a fresh session instead of
    /// retrying a dead refresh token. A network failure leaves them in place.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> AuthResult<Session> {
        let refresh_token = self.tokens.get_refresh_token();
        if refresh_token.is_empty() {
            debug!("No refresh token stored");
            return Err(AuthError::no_refresh_token());
        }

        info!("Refreshing session");

        let request = HttpRequest::new(Method::Post, self.api_url.endpoint(REFRESH_SESSION))
            .header(AUTHORIZATION_HEADER, refresh_token.bearer())
            .json(&json!({}));
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "Refresh request failed");
            AuthError::from(e)
        })?;

        if !response.is_success() {
            let error = AuthError::from_response(response.status, &response.body);
            warn!(status = response.status, code = %error.code, "Refresh rejected, clearing tokens");
            self.tokens.clear_tokens();
            return Err(error);
        }

        let session = match Self::parse_session(&response) {
            Ok(session) => session,
            Err(error) => {
                self.tokens.clear_tokens();
                return Err(error);
            }
        };
        self.store(&session);
        debug!("Session refreshed");
        Ok(session)
    }

    fn parse_session(response: &HttpResponse) -> AuthResult<Session> {
        let value = response
            .json()
            .map_err(|e| AuthError::parse(response.status, format!("Invalid JSON: {}", e)))?;
        Session::from_value(&value)
            .ok_or_else(|| AuthError::parse(response.status, "Response is missing session tokens"))
    }

    fn store(&self, session: &Session) {
        self.tokens.save_tokens(
            session.access_token.clone(),
            session.refresh_token.clone(),
            session.expires_in,
        );
        self.events.emit(AuthEvent::SessionChanged(session.clone()));
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("api_url", &self.api_url)
            .field("game_id", &self.game_id)
            .field("platform", &self.platform)
            .finish()
    }
}
