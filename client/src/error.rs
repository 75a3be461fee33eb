use chatsync_protocol::ChatroomId;
use thiserror::Error;

use crate::config::ConfigError;
use crate::connection::ApiError;
use crate::token_store::StoreError;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
pub const LOGIN_FAILED_MESSAGE: &str =
    "Login failed. Please check your credentials and try again.";
pub const TRANSIENT_MESSAGE: &str = "Error occurred!";

/// Errors surfaced by the engine to its callers
#[derive(Error, Debug)]
pub enum ClientError {
    /// Bad credentials, or an operation that needs a session ran without one
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server rejected the access token; the session has been terminated
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,

    /// Locally invalid input; no request was made
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(#[from] ApiError),

    #[error("Token storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A fetch completed after its chatroom stopped being active
    #[error("Discarded messages for chatroom {chatroom}: no longer active")]
    Stale { chatroom: ChatroomId },
}

impl ClientError {
    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(_) => LOGIN_FAILED_MESSAGE.to_string(),
            Self::SessionExpired => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Validation(message) => message.clone(),
            Self::Config(error) => error.to_string(),
            Self::Network(_) | Self::Storage(_) | Self::Stale { .. } => {
                TRANSIENT_MESSAGE.to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
