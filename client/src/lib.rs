//! Polling client for the chatsync chat API.
//!
//! The engine is split the way the data flows:
//!
//! ```text
//! TokenStore ─> SessionManager ─┬─> ChatroomDirectory
//!                               └─> MessageSynchronizer ─> SyncEvent
//!                  ▲
//!                  └── classify() terminates the session on `token_not_valid`
//! ```
//!
//! [`ChatClient`] wires all of it together from a [`ClientConfig`].

mod auth;
mod classify;
mod config;
mod connection;
mod directory;
mod error;
mod room;
mod state;
mod sync;
mod token_store;

use std::sync::Arc;

use tokio::sync::mpsc;

pub use chatsync_protocol::{ChatroomId, UserId};

pub use auth::SessionManager;
pub use classify::{Classification, classify};
pub use config::{ClientConfig, ConfigError};
pub use connection::{ApiError, Connection};
pub use directory::{ChatroomDirectory, DEFAULT_CHATROOM_NAME};
pub use error::{
    ClientError, LOGIN_FAILED_MESSAGE, Result, SESSION_EXPIRED_MESSAGE, TRANSIENT_MESSAGE,
};
pub use room::{Chatroom, Message, User};
pub use state::{Session, SessionState};
pub use sync::{EMPTY_MESSAGE, MessageSynchronizer, NO_CHATROOM_SELECTED, SyncEvent};
pub use token_store::{
    ACCESS_TOKEN_KEY, FileTokenStore, MemoryTokenStore, REFRESH_TOKEN_KEY, StoreError, TokenPair,
    TokenStore,
};

/// Main chat client
pub struct ChatClient {
    session: SessionManager,
    directory: ChatroomDirectory,
    sync: MessageSynchronizer,
    events: Option<mpsc::UnboundedReceiver<SyncEvent>>,
}

impl ChatClient {
    /// Build a client that persists tokens to [`ClientConfig::token_path`]
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let store = FileTokenStore::new(config.token_path());
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        config.validate()?;
        let connection = Connection::new(&config.base_url, config.request_timeout)?;
        let session = SessionManager::new(connection.clone(), store);
        let directory = ChatroomDirectory::new(session.clone(), connection.clone());
        let (sync, events) =
            MessageSynchronizer::new(session.clone(), connection, config.poll_interval);

        tracing::debug!(base_url = %config.base_url, "Chat client ready");
        Ok(Self {
            session,
            directory,
            sync,
            events: Some(events),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        self.session.login(email, password).await
    }

    /// Stop polling, forget cached chatrooms, and end the session
    pub fn logout(&mut self) {
        self.sync.shutdown();
        self.directory.clear();
        self.session.logout();
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn directory(&self) -> &ChatroomDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut ChatroomDirectory {
        &mut self.directory
    }

    pub fn sync(&self) -> &MessageSynchronizer {
        &self.sync
    }

    /// Receiver for [`SyncEvent`]s; can only be taken once
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SyncEvent>> {
        self.events.take()
    }
}
