use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::UserIdentity;

use super::error::AuthError;
use super::storage::{SessionStorage, StorageError, TOKEN_KEY, USER_KEY};
use super::token;

/// Message used when the server rejects a login without saying why
const LOGIN_FAILED: &str = "Login failed";

/// What the UI layer reads to gate rendering.
#[derive(Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<UserIdentity>,
    pub token: Option<String>,
    pub is_authenticated: bool,
    /// True until `SessionStore::initialize` has run
    pub loading: bool,
}

impl SessionState {
    fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            is_authenticated: false,
            loading: true,
        }
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("is_authenticated", &self.is_authenticated)
            .field("loading", &self.loading)
            .finish()
    }
}

/// Owner of the authenticated identity and its persisted copy.
///
/// Clone is cheap; clones share state, storage and the API client.
#[derive(Clone)]
pub struct SessionStore {
    client: ApiClient,
    storage: Arc<dyn SessionStorage>,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionStore {
    /// Create a store bound to `client`. Until `initialize` runs the state
    /// reports `loading`.
    pub fn new(client: ApiClient, storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let state = Arc::new(state);

        // Token removal on the client (logout or a 401) tears the session down
        let hook_state = Arc::clone(&state);
        let hook_storage = Arc::clone(&storage);
        client.on_invalidate(move || {
            clear_persisted(hook_storage.as_ref());
            hook_state.send_if_modified(|state| {
                let was_authenticated = state.is_authenticated;
                if was_authenticated {
                    state.clear();
                }
                was_authenticated
            });
        });

        Self {
            client,
            storage,
            state,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Restore a persisted session, if a complete and readable one exists.
    /// Anything else is discarded, along with any token already on the
    /// client. Always clears `loading`.
    pub fn initialize(&self) -> bool {
        let restored = match self.read_persisted() {
            Ok(Some((token, user))) => {
                self.client.set_auth_token(token.clone());
                Some((token, user))
            }
            Ok(None) => None,
            Err(reason) => {
                warn!(reason = %reason, "Discarding persisted session");
                clear_persisted(self.storage.as_ref());
                None
            }
        };
        if restored.is_none() && self.client.has_auth_token() {
            self.client.remove_auth_token();
        }

        let is_restored = restored.is_some();
        self.state.send_modify(|state| {
            match restored {
                Some((token, user)) => {
                    state.user = Some(user);
                    state.token = Some(token);
                    state.is_authenticated = true;
                }
                None => state.clear(),
            }
            state.loading = false;
        });

        debug!(restored = is_restored, "Session initialized");
        is_restored
    }

    fn read_persisted(&self) -> Result<Option<(String, UserIdentity)>, String> {
        let token = self.storage.get(TOKEN_KEY).map_err(|e| e.to_string())?;
        let user = self.storage.get(USER_KEY).map_err(|e| e.to_string())?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) if !token.is_empty() => {
                let user: UserIdentity = serde_json::from_str(&user)
                    .map_err(|e| format!("unreadable user record: {}", e))?;
                Ok(Some((token, user)))
            }
            _ => Err("incomplete session".to_string()),
        }
    }

    fn persist(&self, token: &str, user: &UserIdentity) -> Result<(), StorageError> {
        let user = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &user)?;
        Ok(())
    }

    /// Log in and persist the session.
    /// Errors from the API call are returned untouched; nothing is retried.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<UserIdentity, AuthError> {
        let envelope = self.client.login(identifier, secret).await?;
        let data = match envelope.data {
            Some(data) if envelope.success => data,
            _ => {
                let message = envelope
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| LOGIN_FAILED.to_string());
                return Err(AuthError::LoginRejected(message));
            }
        };

        let user = data.identity();
        if let Err(e) = self.persist(&data.token, &user) {
            warn!(error = %e, "Failed to persist session");
            self.logout();
            return Err(e.into());
        }

        self.client.set_auth_token(data.token.clone());
        let state_user = user.clone();
        self.state.send_modify(move |state| {
            state.user = Some(state_user);
            state.token = Some(data.token);
            state.is_authenticated = true;
            state.loading = false;
        });

        info!(user_id = %user.user_id, "Logged in");
        Ok(user)
    }

    /// Clear memory, storage and the client token. Safe when logged out.
    pub fn logout(&self) {
        self.state.send_modify(|state| {
            state.clear();
            state.loading = false;
        });
        clear_persisted(self.storage.as_ref());
        self.client.remove_auth_token();
        info!("Logged out");
    }

    /// Local expiry check; true when there is no usable token
    pub fn is_token_expired(&self) -> bool {
        token::is_expired(self.state.borrow().token.as_deref())
    }

    /// Pass/fail expiry check. An expired session is logged out.
    pub fn refresh_session(&self) -> bool {
        if self.is_token_expired() {
            if self.is_authenticated() {
                warn!("Session token expired");
            }
            self.logout();
            return false;
        }
        true
    }

    // ===== Accessors =====

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().token.as_deref().and_then(token::expires_at)
    }

    /// Minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.expires_at()
            .map(|expiry| (expiry - Utc::now()).num_minutes().max(0))
    }
}

fn clear_persisted(storage: &dyn SessionStorage) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = storage.remove(key) {
            warn!(key = key, error = %e, "Failed to clear persisted session key");
        }
    }
}
