
use serde::Deserialize;

use crate::{ChatroomId, ParseError, UserId};

/// Error code the server uses for an invalid or expired access token
pub const TOKEN_NOT_VALID: &str = "token_not_valid";

/// Envelope returned by POST /api/login/
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub data: LoginData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginData {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Directory entry from GET /api/users/
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Chatroom as listed or created by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatroomRecord {
    pub id: ChatroomId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub users: Vec<MemberRef>,
}

/// Chatroom members come back either as bare ids or as nested user objects
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MemberRef {
    Id(UserId),
    User { id: UserId },
}

impl MemberRef {
    pub fn id(&self) -> UserId {
        match self {
            Self::Id(id) | Self::User { id } => *id,
        }
    }
}

/// One entry of GET /api/chatroom/ID/messages/
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageRecord {
    pub sender: SenderRecord,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SenderRecord {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Structured error payload attached to non-2xx responses
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human readable detail, if the server sent one
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(text) => Some(text.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Parse a login response body, rejecting a session without an access token
pub fn parse_login_response(body: &str) -> Result<LoginData, ParseError> {
    let response: LoginResponse = serde_json::from_str(body)?;

    if response.data.access_token.trim().is_empty() {
        return Err(ParseError::MissingField("access_token".to_string()));
    }

    Ok(response.data)
}

/// Parse an error body leniently; anything unrecognised yields an empty body
pub fn parse_error_body(body: &str) -> ErrorBody {
    serde_json::from_str(body).unwrap_or_default()
}
