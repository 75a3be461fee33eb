use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{CreateChatroomRequest, Endpoint, LoginRequest, Method, SendMessageRequest};
pub use server::{
    ChatroomRecord, ErrorBody, LoginData, LoginResponse, MemberRef, MessageRecord, SenderRecord,
    TOKEN_NOT_VALID, UserRecord, parse_error_body, parse_login_response,
};

/// Server-assigned user identifier
pub type UserId = u64;

/// Server-assigned chatroom identifier
pub type ChatroomId = u64;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid response body: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
