use std::sync::{Arc, PoisonError, RwLock};

use chatsync_protocol::LoginRequest;

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::state::{Session, SessionState};
use crate::token_store::{TokenPair, TokenStore};

struct SessionInner {
    connection: Connection,
    store: Arc<dyn TokenStore>,
    session: RwLock<Option<Session>>,
}

/// Owns the authenticated identity and the persisted token pair.
///
/// Cheap to clone; every clone observes the same session. Other components
/// take a clone instead of reaching for shared global state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(connection: Connection, store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                connection,
                store,
                session: RwLock::new(None),
            }),
        }
    }

    /// Authenticate with email and password.
    ///
    /// On failure any previous session and its persisted tokens are left as they were.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::Auth("email and password are required".to_string()));
        }

        let data = self
            .inner
            .connection
            .login(&LoginRequest { email, password })
            .await
            .map_err(|e| {
                tracing::warn!(email = %email, error = %e, "Login failed");
                ClientError::Auth(e.to_string())
            })?;

        let session = Session::from(data);
        self.inner.store.save(&session.tokens)?;
        *self.write() = Some(session.clone());

        tracing::info!(user_id = session.user_id, email = %session.email, "Logged in");
        Ok(session)
    }

    /// Clear the session and persisted tokens. Safe to call in any state.
    pub fn logout(&self) {
        self.clear();
        tracing::info!("Logged out");
    }

    /// Forced logout after the server rejected the access token
    pub fn terminate(&self) {
        self.clear();
        tracing::warn!("Session expired; terminated");
    }

    fn clear(&self) {
        if let Err(e) = self.inner.store.clear() {
            tracing::error!(error = %e, "Failed to clear persisted tokens");
        }
        *self.write() = None;
    }

    pub fn current_session(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Bearer token for authenticated requests
    pub fn access_token(&self) -> Result<String> {
        self.read()
            .as_ref()
            .map(|s| s.access_token().to_string())
            .ok_or_else(|| ClientError::Auth("no active session".to_string()))
    }

    /// Tokens left on disk by a previous run, if any
    pub fn persisted_tokens(&self) -> Result<Option<TokenPair>> {
        Ok(self.inner.store.load()?)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}
