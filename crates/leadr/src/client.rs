//! The client facade.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use crate::auth::{AuthCoordinator, AuthEvent, EventBus, NonceProvider, SessionClient};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult, Error, TransportError};
use crate::http::{Headers, HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use crate::store::{DeviceFingerprint, FingerprintSource, KeyValueStore, MemoryStore, TokenStore};
use crate::types::Session;

/// Authenticated client for the leaderboard API.
///
/// The client owns the credential store and the authentication coordinator.
/// It is cheap to clone; clones share tokens, the refresh gate and the
/// event channel.
///
/// # Example
///
/// ```no_run
/// use leadr::{ApiUrl, ClientConfig, LeadrClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::new(ApiUrl::new("https://api.leadr.gg")?, "gam_123");
/// let client = LeadrClient::new(config)?;
///
/// let boards = client.get("/v1/client/boards").await?;
/// println!("{}", boards);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LeadrClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    events: EventBus,
    coordinator: AuthCoordinator,
}

/// Builder for [`LeadrClient`].
///
/// Anything not overridden falls back to the production default: a
/// [`ReqwestTransport`], an in-memory store, the device fingerprint and the
/// system clock.
pub struct LeadrClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn KeyValueStore>>,
    fingerprint: Option<Arc<dyn FingerprintSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl LeadrClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Persist credentials in `store` instead of memory.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn fingerprint(mut self, fingerprint: Arc<dyn FingerprintSource>) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the configuration and assemble the client.
    ///
    /// Stored credentials are loaded here; no network request is made.
    pub fn build(self) -> Result<LeadrClient, Error> {
        let config = self.config;
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.request_timeout)?),
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let fingerprint = self
            .fingerprint
            .unwrap_or_else(|| Arc::new(DeviceFingerprint));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let tokens = Arc::new(TokenStore::load(
            store,
            &config.storage_namespace,
            clock,
            fingerprint,
        ));
        let events = EventBus::new();

        let sessions = SessionClient::new(
            config.api_url.clone(),
            config.game_id.clone(),
            config.platform.clone(),
            transport.clone(),
            tokens.clone(),
            events.clone(),
        );
        let nonces = NonceProvider::new(config.api_url.clone(), transport.clone(), tokens.clone());
        let coordinator = AuthCoordinator::new(
            sessions,
            nonces,
            tokens.clone(),
            events.clone(),
            config.refresh_threshold_secs,
        );

        debug!(
            api_url = %config.api_url,
            game_id = %config.game_id,
            has_token = tokens.has_token(),
            "Client initialized"
        );

        Ok(LeadrClient {
            inner: Arc::new(ClientInner {
                config,
                transport,
                tokens,
                events,
                coordinator,
            }),
        })
    }
}

impl LeadrClient {
    pub fn builder(config: ClientConfig) -> LeadrClientBuilder {
        LeadrClientBuilder {
            config,
            transport: None,
            store: None,
            fingerprint: None,
            clock: None,
        }
    }

    /// Build a client with all defaults.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Receive session and authentication events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Start a new session, replacing any stored tokens.
    pub async fn start_session(&self) -> AuthResult<Session> {
        self.inner.coordinator.start_session().await
    }

    /// Refresh the current session. Concurrent calls share one request.
    pub async fn refresh_session(&self) -> AuthResult<Session> {
        self.inner.coordinator.refresh_token().await
    }

    /// Fetch a one-time nonce, or `None` if one could not be obtained.
    pub async fn get_nonce(&self) -> Option<String> {
        self.inner.coordinator.get_nonce().await
    }

    /// Forget the stored tokens. The device fingerprint is kept.
    pub fn sign_out(&self) {
        info!("Signing out");
        self.inner.tokens.clear_tokens();
    }

    /// Run a caller-built request through the authentication lifecycle.
    ///
    /// See [`AuthCoordinator`] for the stages and retry rules.
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
        self.inner
            .coordinator
            .execute_authenticated(perform, parse, requires_nonce)
            .await
    }

    /// Send a request to `path` and deserialize the response body.
    #[instrument(skip(self, body))]
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        requires_nonce: bool,
    ) -> AuthResult<T> {
        let (status, value) = self.send(method, path, body, requires_nonce).await?;
        serde_json::from_value(value)
            .map_err(|e| AuthError::parse(status, format!("Unexpected response shape: {}", e)))
    }

    pub async fn get(&self, path: &str) -> AuthResult<Value> {
        self.execute_json(Method::Get, path, None, false).await
    }

    pub async fn post(&self, path: &str, body: Value, requires_nonce: bool) -> AuthResult<Value> {
        self.execute_json(Method::Post, path, Some(body), requires_nonce)
            .await
    }

    pub async fn delete(&self, path: &str, requires_nonce: bool) -> AuthResult<Value> {
        self.execute_json(Method::Delete, path, None, requires_nonce)
            .await
    }

    /// Returns the status of the final response with its JSON body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        requires_nonce: bool,
    ) -> AuthResult<(u16, Value)> {
        let url = self.inner.config.api_url.endpoint(path);
        let transport = self.inner.transport.clone();
        let status = Arc::new(AtomicU16::new(0));
        let seen = status.clone();

        let value = self
            .execute_authenticated(
                move |headers| {
                    let mut request = HttpRequest::new(method, url.clone()).headers(headers);
                    if let Some(body) = &body {
                        request = request.json(body);
                    }
                    let transport = transport.clone();
                    let seen = seen.clone();
                    async move {
                        let response = transport.send(request).await;
                        if let Ok(response) = &response {
                            seen.store(response.status, Ordering::Relaxed);
                        }
                        response
                    }
                },
                |value| value,
                requires_nonce,
            )
            .await?;

        Ok((status.load(Ordering::Relaxed), value))
    }
}

impl std::fmt::Debug for LeadrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadrClient")
            .field("config", &self.inner.config)
            .field("tokens", &self.inner.tokens)
            .finish()
    }
}
