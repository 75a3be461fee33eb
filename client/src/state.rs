use chatsync_protocol::{LoginData, UserId};

use crate::token_store::TokenPair;

/// Authenticated identity of the current user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tokens: TokenPair,
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        match full.trim() {
            "" => self.email.clone(),
            name => name.to_string(),
        }
    }
}

impl From<LoginData> for Session {
    fn from(data: LoginData) -> Self {
        Self {
            user_id: data.id,
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            tokens: TokenPair {
                access_token: data.access_token,
                refresh_token: data.refresh_token,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}
