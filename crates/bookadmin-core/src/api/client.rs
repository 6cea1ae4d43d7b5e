//! API client for the booking platform's admin REST API.
//!
//! `ApiClient` is the single point of outbound communication. It owns the
//! base URL and the current bearer token, builds each request with uniform
//! headers, and turns responses into either the parsed envelope or a typed
//! `ApiError`.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::Config;

use super::envelope::Envelope;
use super::request::{Method, MultipartForm, Request, RequestBody};
use super::transport::{HttpBody, HttpRequest, ReqwestTransport, Transport};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither the environment nor the config file set one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3005/api";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Capacity of the client event channel. Events are rare (one per 401).
const EVENT_CHANNEL_CAPACITY: usize = 16;

const CONTENT_TYPE: &str = "Content-Type";
const AUTHORIZATION: &str = "Authorization";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Signals emitted to the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// The server rejected the bearer token (HTTP 401). The token has been
    /// dropped; the shell should send the user back to the login screen.
    SessionInvalidated,
}

type InvalidationHook = Arc<dyn Fn() + Send + Sync>;

/// API client for the admin backend.
/// Clone is cheap and clones share the token, hooks and transport.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    token: Arc<RwLock<Option<String>>>,
    hooks: Arc<RwLock<Vec<InvalidationHook>>>,
    events: broadcast::Sender<ClientEvent>,
}

impl ApiClient {
    /// Create a client backed by `reqwest` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(Duration::from_secs(REQUEST_TIMEOUT_SECS))?;
        Ok(Self::with_transport(base_url, Arc::new(transport)))
    }

    /// Create a client from resolved configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config.api_base_url(), Arc::new(transport)))
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            base_url,
            transport,
            token: Arc::new(RwLock::new(None)),
            hooks: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ===== Token =====

    /// Set the bearer token for subsequent requests
    pub fn set_auth_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
        debug!("Auth token set");
    }

    /// Drop the bearer token and clear any persisted session.
    /// Safe to call when no token is set.
    pub fn remove_auth_token(&self) {
        self.token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.run_invalidation_hooks();
        debug!("Auth token removed");
    }

    pub fn has_auth_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn current_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ===== Session invalidation =====

    /// Register a hook run whenever the token is removed, including on 401.
    /// The session store uses this to clear its in-memory and persisted state.
    pub fn on_invalidate(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Subscribe to client events (session invalidation)
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn run_invalidation_hooks(&self) {
        // Snapshot so a hook can't deadlock against the registry
        let hooks: Vec<InvalidationHook> = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            hook();
        }
    }

    fn invalidate_session(&self) {
        self.remove_auth_token();
        // No subscribers is fine
        let _ = self.events.send(ClientEvent::SessionInvalidated);
    }

    // ===== Request construction =====

    fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<String, ApiError> {
        let raw = format!("{}{}", self.base_url, path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", raw, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url.to_string())
    }

    fn build_headers(
        &self,
        custom: &[(String, String)],
        multipart: bool,
    ) -> Result<Vec<(String, String)>, ApiError> {
        let mut headers = vec![(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())];

        for (name, value) in custom {
            if name.is_empty() || has_line_break(name) || has_line_break(value) {
                return Err(ApiError::InvalidRequest(format!("bad header: {}", name)));
            }
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        // The transport sets multipart/form-data with its own boundary
        if multipart {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(CONTENT_TYPE));
        }

        if let Some(token) = self.current_token() {
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(AUTHORIZATION));
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {}", token)));
        }

        Ok(headers)
    }

    fn build_request(&self, request: Request) -> Result<HttpRequest, ApiError> {
        let multipart = matches!(request.body, RequestBody::Multipart(_));
        let url = self.build_url(&request.path, &request.query)?;
        let headers = self.build_headers(&request.headers, multipart)?;
        let body = match request.body {
            RequestBody::None => HttpBody::Empty,
            RequestBody::Json(value) => HttpBody::Bytes(
                serde_json::to_vec(&value).map_err(|e| ApiError::InvalidRequest(e.to_string()))?,
            ),
            RequestBody::Multipart(form) => HttpBody::Multipart(form),
        };

        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    // ===== Core request =====

    /// Issue one request and return the parsed response envelope verbatim.
    ///
    /// - 401: the token is dropped, the session is invalidated and the call
    ///   fails with `ApiError::AuthExpired` before the body is looked at.
    /// - 204: resolves to `{"success": true}` without parsing.
    /// - any other status: the body must be JSON (`MalformedResponse`
    ///   otherwise); non-2xx fails with `ApiError::Http`.
    pub async fn request(&self, request: Request) -> Result<Value, ApiError> {
        let http = self.build_request(request)?;
        let method = http.method;
        let url = http.url.clone();

        debug!(
            method = %method,
            url = %url,
            has_auth = http.header(AUTHORIZATION).is_some(),
            "API request"
        );

        let response = self.transport.send(http).await.map_err(|e| {
            warn!(method = %method, url = %url, error = %e, "API request failed");
            ApiError::Network(e)
        })?;

        debug!(method = %method, url = %url, status = response.status, "API response");

        if response.status == 401 {
            warn!(url = %url, "Unauthorized - token expired or invalid");
            self.invalidate_session();
            return Err(ApiError::AuthExpired);
        }

        if response.status == 204 {
            return Ok(json!({ "success": true }));
        }

        let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
            let text = String::from_utf8_lossy(&response.body);
            ApiError::MalformedResponse(format!(
                "status {}: {} ({})",
                response.status,
                e,
                ApiError::truncate_body(&text)
            ))
        })?;

        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &body));
        }

        Ok(body)
    }

    /// Issue a request and validate the envelope's `data` against `T`
    pub async fn request_data<T: DeserializeOwned>(&self, request: Request) -> Result<T, ApiError> {
        let value = self.request(request).await?;
        Envelope::<T>::from_value(value)?.into_data()
    }

    // ===== HTTP verbs =====

    pub async fn get<K, V>(
        &self,
        path: &str,
        query: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Value, ApiError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.request(Request::new(Method::Get, path).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.request(Request::new(Method::Post, path).json(to_json(body)?))
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.request(Request::new(Method::Put, path).json(to_json(body)?))
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        self.request(Request::new(Method::Patch, path).json(to_json(body)?))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Request::new(Method::Delete, path)).await
    }

    /// POST a multipart form
    pub async fn upload(&self, path: &str, form: MultipartForm) -> Result<Value, ApiError> {
        self.upload_with(Method::Post, path, form).await
    }

    /// Send a multipart form with an explicit method
    pub async fn upload_with(
        &self,
        method: Method,
        path: &str,
        form: MultipartForm,
    ) -> Result<Value, ApiError> {
        self.request(Request::new(method, path).multipart(form)).await
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}
