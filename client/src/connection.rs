use std::time::Duration;

use chatsync_protocol::{
    ChatroomId, ChatroomRecord, CreateChatroomRequest, Endpoint, LoginData, LoginRequest, Method,
    MessageRecord, SendMessageRequest, UserRecord, parse_error_body, parse_login_response,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Transport-level failure of a single API call
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Server returned status {status}: {detail}")]
    Status {
        status: u16,
        code: Option<String>,
        detail: String,
    },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Structured error code from the server payload, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

/// HTTP connection to the chat API
#[derive(Clone)]
pub struct Connection {
    http: reqwest::Client,
    base_url: String,
}

impl Connection {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginData, ApiError> {
        let body = self.execute(Endpoint::Login, None, Some(request)).await?;
        parse_login_response(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, ApiError> {
        self.get(Endpoint::Users, token).await
    }

    pub async fn list_chatrooms(&self, token: &str) -> Result<Vec<ChatroomRecord>, ApiError> {
        self.get(Endpoint::Chatrooms, token).await
    }

    pub async fn create_chatroom(
        &self,
        token: &str,
        request: &CreateChatroomRequest,
    ) -> Result<ChatroomRecord, ApiError> {
        let body = self
            .execute(Endpoint::CreateChatroom, Some(token), Some(request))
            .await?;
        decode(&body)
    }

    pub async fn fetch_messages(
        &self,
        token: &str,
        chatroom: ChatroomId,
    ) -> Result<Vec<MessageRecord>, ApiError> {
        self.get(Endpoint::Messages(chatroom), token).await
    }

    /// The response body is ignored
    pub async fn send_message(
        &self,
        token: &str,
        chatroom: ChatroomId,
        request: &SendMessageRequest<'_>,
    ) -> Result<(), ApiError> {
        self.execute(Endpoint::SendMessage(chatroom), Some(token), Some(request))
            .await
            .map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint, token: &str) -> Result<T, ApiError> {
        let body = self.execute::<()>(endpoint, Some(token), None).await?;
        decode(&body)
    }

    /// Send one request and return the body of a 2xx response
    async fn execute<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let path = endpoint.path();
        let response = self.request(&endpoint, token, body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(path = %path, status = status.as_u16(), "API response");

        if !status.is_success() {
            let error = parse_error_body(&text);
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error
                    .detail_text()
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
                code: error.code,
            });
        }

        Ok(text)
    }

    /// The bearer token is attached only for endpoints that require auth
    fn request<B: Serialize + ?Sized>(
        &self,
        endpoint: &Endpoint,
        token: Option<&str>,
        body: Option<&B>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint.path());

        let mut request = match endpoint.method() {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
        };
        if let Some(token) = token.filter(|_| endpoint.requires_auth()) {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
