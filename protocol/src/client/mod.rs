use serde::Serialize;

use crate::{ChatroomId, UserId};

/// HTTP verbs used by the chat API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Endpoints the client can call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// POST /api/login/
    Login,

    /// GET /api/users/
    Users,

    /// GET /api/chatroom/
    Chatrooms,

    /// POST /api/chatroom/create/
    CreateChatroom,

    /// GET /api/chatroom/ID/messages/
    Messages(ChatroomId),

    /// POST /api/chatroom/ID/send/
    SendMessage(ChatroomId),
}

impl Endpoint {
    /// Path relative to the server base url
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/api/login/".to_string(),
            Self::Users => "/api/users/".to_string(),
            Self::Chatrooms => "/api/chatroom/".to_string(),
            Self::CreateChatroom => "/api/chatroom/create/".to_string(),
            Self::Messages(id) => format!("/api/chatroom/{}/messages/", id),
            Self::SendMessage(id) => format!("/api/chatroom/{}/send/", id),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Users | Self::Chatrooms | Self::Messages(_) => Method::Get,
            Self::Login | Self::CreateChatroom | Self::SendMessage(_) => Method::Post,
        }
    }

    /// Whether the endpoint expects a bearer token
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateChatroomRequest {
    pub name: String,
    pub users: Vec<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}
