//! One-time mutation nonces.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::http::{AUTHORIZATION_HEADER, GET_NONCE, HttpRequest, Method, NonceResponse, Transport};
use crate::store::TokenStore;
use crate::types::ApiUrl;

/// Fetches single-use nonces for mutating requests.
///
/// Failures are deliberately collapsed to `None`: a missing nonce always
/// surfaces as a `nonce_error` from the request that needed it.
#[derive(Clone)]
pub struct NonceProvider {
    api_url: ApiUrl,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
}

impl NonceProvider {
    pub fn new(api_url: ApiUrl, transport: Arc<dyn Transport>, tokens: Arc<TokenStore>) -> Self {
        Self {
            api_url,
            transport,
            tokens,
        }
    }

    /// Fetch a fresh nonce using the current access token.
    #[instrument(skip(self))]
    pub async fn get_nonce(&self) -> Option<String> {
        let token = self.tokens.get_access_token();
        if token.is_empty() {
            debug!("No access token, cannot fetch nonce");
            return None;
        }

        let request = HttpRequest::new(Method::Get, self.api_url.endpoint(GET_NONCE))
            .header(AUTHORIZATION_HEADER, token.bearer());

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Nonce request failed");
                return None;
            }
        };

        if response.status != 200 {
            warn!(status = response.status, "Nonce request rejected");
            return None;
        }

        match serde_json::from_slice::<NonceResponse>(&response.body) {
            Ok(body) if !body.nonce.is_empty() => Some(body.nonce),
            Ok(_) => {
                warn!("Empty nonce in response");
                None
            }
            Err(e) => {
                warn!(error = %e, "Unreadable nonce response");
                None
            }
        }
    }
}

impl std::fmt::Debug for NonceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceProvider")
            .field("api_url", &self.api_url)
            .finish()
    }
}
