//! Authenticated request lifecycle.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::{AuthError, AuthResult, TransportError};
use crate::http::{AUTHORIZATION_HEADER, Headers, HttpResponse, NONCE_HEADER};
use crate::store::TokenStore;
use crate::types::Session;

use super::events::{AuthEvent, EventBus};
use super::nonce::NonceProvider;
use super::refresh::{RefreshGate, SharedRefresh};
use super::session_client::SessionClient;

const UNAUTHORIZED: u16 = 401;
const PRECONDITION_FAILED: u16 = 412;

/// Drives every authenticated API call.
///
/// A call to [`execute_authenticated`](Self::execute_authenticated) runs
/// these stages in order, stopping at the first terminal failure:
///
/// 1. start a session if no access token is stored;
/// 2. refresh if the token expires within the threshold, falling back to a
///    new session if the refresh fails;
/// 3. build the `Authorization` header;
/// 4. fetch a nonce when the call mutates state;
/// 5. dispatch;
/// 6. on 401, refresh (or restart) once and dispatch again;
/// 7. on 412 for a nonce-carrying call, fetch a new nonce and dispatch again;
/// 8. turn any remaining non-2xx into an error;
/// 9. parse the body and hand it to the caller's mapper.
///
/// So a single call dispatches at most three times.
pub struct AuthCoordinator {
    sessions: SessionClient,
    nonces: NonceProvider,
    tokens: Arc<TokenStore>,
    events: EventBus,
    refresh_gate: RefreshGate,
    refresh_threshold_secs: i64,
}

impl AuthCoordinator {
    pub fn new(
        sessions: SessionClient,
        nonces: NonceProvider,
        tokens: Arc<TokenStore>,
        events: EventBus,
        refresh_threshold_secs: i64,
    ) -> Self {
        Self {
            sessions,
            nonces,
            tokens,
            events,
            refresh_gate: RefreshGate::new(),
            refresh_threshold_secs,
        }
    }

    /// Start a new session, replacing any stored tokens.
    pub async fn start_session(&self) -> AuthResult<Session> {
        self.sessions.start_session().await
    }

    /// Refresh the session, joining a refresh that is already running.
    pub async fn refresh_token(&self) -> AuthResult<Session> {
        self.refresh_shared().await.as_ref().clone()
    }

    /// Like [`refresh_token`](Self::refresh_token), but returns the outcome
    /// object shared by every caller of the same refresh.
    pub async fn refresh_shared(&self) -> SharedRefresh {
        self.refresh_gate.run(|| self.sessions.refresh_token()).await
    }

    /// Fetch a one-time nonce with the current access token.
    pub async fn get_nonce(&self) -> Option<String> {
        self.nonces.get_nonce().await
    }

    #[cfg(test)]
    fn refresh_gate(&self) -> &RefreshGate {
        &self.refresh_gate
    }

    /// A failed refresh must not be terminal while a new session can still
    /// be created.
    async fn refresh_or_restart(&self) -> AuthResult<Session> {
        match self.refresh_token().await {
            Ok(session) => Ok(session),
            Err(error) => {
                info!(code = %error.code, "Refresh failed, starting a new session");
                self.sessions.start_session().await
            }
        }
    }

    async fn ensure_session(&self) -> AuthResult<()> {
        if !self.tokens.has_token() {
            debug!("No access token, starting session");
            self.sessions.start_session().await?;
        }

        if self.tokens.is_expiring_soon(self.refresh_threshold_secs) {
            debug!(
                threshold = self.refresh_threshold_secs,
                "Access token expiring, refreshing"
            );
            self.refresh_or_restart().await?;
        }

        Ok(())
    }

    fn auth_headers(&self) -> Headers {
        Headers::new().with(AUTHORIZATION_HEADER, self.tokens.get_access_token().bearer())
    }

    /// Headers for one dispatch, including a fresh nonce when required.
    async fn dispatch_headers(&self, requires_nonce: bool, nonce_status: u16) -> AuthResult<Headers> {
        let mut headers = self.auth_headers();
        if requires_nonce {
            let nonce = self.nonces.get_nonce().await.ok_or_else(|| {
                warn!(stage_status = nonce_status, "Nonce unavailable");
                AuthError::nonce(nonce_status)
            })?;
            headers.insert(NONCE_HEADER, nonce);
        }
        Ok(headers)
    }

    async fn dispatch<P, Fut>(&self, perform: &P, headers: Headers) -> AuthResult<HttpResponse>
    where
        P: Fn(Headers) -> Fut,
        Fut: Future<Output = Result<HttpResponse, TransportError>>,
    {
        perform(headers).await.map_err(|e| {
            warn!(error = %e, "Request failed");
            AuthError::from(e)
        })
    }

    /// Run an authenticated request.
    ///
    /// `perform` sends the request with the headers it is given and may be
    /// called up to three times. `parse` maps the JSON body of the final 2xx
    /// response (`null` if empty) to the result.
    #[instrument(skip(self, perform, parse))]
    pub async fn execute_authenticated<T, P, Fut, F>(
        &self,
        perform: P,
        parse: F,
        requires_nonce: bool,
    ) -> AuthResult<T>
    where
        P: Fn(Headers) -> Fut,
        Fut: Future<Output = Result<HttpResponse, TransportError>>,
        F: FnOnce(Value) -> T,
    {
        self.ensure_session().await?;

        let headers = self.dispatch_headers(requires_nonce, 0).await?;
        let mut response = self.dispatch(&perform, headers).await?;

        if response.status == UNAUTHORIZED {
            info!("Request unauthorized, refreshing and retrying");
            if let Err(error) = self.refresh_or_restart().await {
                warn!(code = %error.code, "Could not re-authenticate");
                self.events.emit(AuthEvent::AuthFailed(error.clone()));
                return Err(error);
            }
            let headers = self.dispatch_headers(requires_nonce, 0).await?;
            response = self.dispatch(&perform, headers).await?;
        }

        if response.status == PRECONDITION_FAILED && requires_nonce {
            info!("Nonce rejected, retrying with a fresh nonce");
            let headers = self.dispatch_headers(true, PRECONDITION_FAILED).await?;
            response = self.dispatch(&perform, headers).await?;
        }

        if !response.is_success() {
            let error = AuthError::from_response(response.status, &response.body);
            debug!(status = response.status, code = %error.code, "Request failed");
            return Err(error);
        }

        let value = response
            .json()
            .map_err(|e| AuthError::parse(response.status, format!("Invalid JSON: {}", e)))?;
        Ok(parse(value))
    }
}

impl std::fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCoordinator")
            .field("sessions", &self.sessions)
            .field("refresh_threshold_secs", &self.refresh_threshold_secs)
            .field("refresh_in_progress", &self.refresh_gate.in_progress())
            .finish()
    }
}
