//! In-crate test doubles.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::clock::ManualClock;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Method, Transport};
use crate::store::{FingerprintSource, MemoryStore, TokenStore};
use crate::types::ApiUrl;

pub const NOW: i64 = 1_700_000_000;
pub const BASE: &str = "https://api.test";

type Scripted = Result<HttpResponse, TransportError>;

/// Transport that replays queued responses per `METHOD path` and records
/// every request. Each send yields once so concurrent callers interleave.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn key(method: Method, path: &str) -> String {
        format!("{} {}", method, path)
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let body = if body.is_null() {
            Vec::new()
        } else {
            body.to_string().into_bytes()
        };
        self.push(method, path, Ok(HttpResponse::new(status, body)));
    }

    pub fn push_raw(&self, method: Method, path: &str, status: u16, body: &[u8]) {
        self.push(method, path, Ok(HttpResponse::new(status, body.to_vec())));
    }

    pub fn fail(&self, method: Method, path: &str) {
        self.push(
            method,
            path,
            Err(TransportError::Connection {
                message: "connection refused".to_string(),
            }),
        );
    }

    fn push(&self, method: Method, path: &str, response: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(Self::key(method, path))
            .or_default()
            .push_back(response);
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| path_of(&r.url) == path)
            .cloned()
            .collect()
    }
}

fn path_of(url: &str) -> String {
    url::Url::parse(url).unwrap().path().to_string()
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = Self::key(request.method, &path_of(&request.url));
        self.requests.lock().unwrap().push(request);
        tokio::task::yield_now().await;
        self.routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Connection {
                    message: format!("no scripted response for {}", key),
                })
            })
    }
}

pub struct FixedFingerprint;

impl FingerprintSource for FixedFingerprint {
    fn fingerprint(&self) -> String {
        "fp-test".to_string()
    }
}

pub fn api_url() -> ApiUrl {
    ApiUrl::new(BASE).unwrap()
}

pub fn token_store() -> (Arc<ManualClock>, Arc<TokenStore>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let store = TokenStore::load(
        Arc::new(MemoryStore::new()),
        "leadr",
        clock.clone(),
        Arc::new(FixedFingerprint),
    );
    (clock, Arc::new(store))
}

pub fn session_body(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({
        "id": "ses_1",
        "device_id": "dev_1",
        "account_id": "acc_1",
        "game_id": "gam_1",
        "platform": "linux",
        "client_fingerprint": "fp-test",
        "status": "active",
        "expires_in": expires_in,
        "access_token": access,
        "refresh_token": refresh
    })
}
