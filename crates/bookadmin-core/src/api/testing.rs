//! In-memory transport and token helpers for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, response: Result<HttpResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_json(&self, status: u16, body: Value) {
        self.push(Ok(HttpResponse::new(status, body.to_string())));
    }

    pub(crate) fn push_network_error(&self, message: &str) {
        self.push(Err(TransportError(message.to_string())));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no response queued".to_string())))
    }
}

/// Build an unsigned three-segment JWT carrying the given claims
pub(crate) fn make_token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

/// A token expiring `offset_secs` from now (negative for the past)
pub(crate) fn token_expiring_in(offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + offset_secs;
    make_token(serde_json::json!({ "sub": "1", "exp": exp }))
}

/// Route every keyring `Entry` created after this call to the in-memory mock
pub(crate) fn use_mock_keychain() {
    keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
}
