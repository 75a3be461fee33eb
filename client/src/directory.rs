use std::collections::BTreeSet;

use chatsync_protocol::{ChatroomId, CreateChatroomRequest, UserId};

use crate::auth::SessionManager;
use crate::classify::escalate;
use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::room::{Chatroom, User};

/// Name sent when a chatroom is created without one
pub const DEFAULT_CHATROOM_NAME: &str = "Chatroom with selected users";

/// Lists users and chatrooms, creates chatrooms, and caches what it has seen
pub struct ChatroomDirectory {
    session: SessionManager,
    connection: Connection,
    chatrooms: Vec<Chatroom>,
}

impl ChatroomDirectory {
    pub fn new(session: SessionManager, connection: Connection) -> Self {
        Self {
            session,
            connection,
            chatrooms: Vec::new(),
        }
    }

    /// Every user that can be invited to a chatroom
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let token = self.session.access_token()?;
        let records = self
            .connection
            .list_users(&token)
            .await
            .map_err(|e| escalate(&self.session, e))?;

        Ok(records.into_iter().map(User::from).collect())
    }

    /// Refetch the chatroom list, replacing the cache
    pub async fn list_chatrooms(&mut self) -> Result<&[Chatroom]> {
        let token = self.session.access_token()?;
        let records = self
            .connection
            .list_chatrooms(&token)
            .await
            .map_err(|e| escalate(&self.session, e))?;

        self.chatrooms = records.into_iter().map(Chatroom::from).collect();
        tracing::debug!(count = self.chatrooms.len(), "Chatroom list refreshed");
        Ok(&self.chatrooms)
    }

    /// Create a chatroom with the given members.
    ///
    /// The result is appended to the cache without a refetch and is not selected.
    pub async fn create_chatroom(
        &mut self,
        member_ids: &BTreeSet<UserId>,
        name: Option<&str>,
    ) -> Result<Chatroom> {
        if member_ids.is_empty() {
            return Err(ClientError::Validation(
                "Select at least one user to create a chatroom.".to_string(),
            ));
        }
        let token = self.session.access_token()?;

        let request = CreateChatroomRequest {
            name: name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_CHATROOM_NAME)
                .to_string(),
            users: member_ids.iter().copied().collect(),
        };
        let record = self
            .connection
            .create_chatroom(&token, &request)
            .await
            .map_err(|e| escalate(&self.session, e))?;

        let chatroom = Chatroom::from(record);
        tracing::info!(chatroom = chatroom.id, members = member_ids.len(), "Chatroom created");
        self.chatrooms.push(chatroom.clone());
        Ok(chatroom)
    }

    /// Cached chatrooms; no request is made
    pub fn chatrooms(&self) -> &[Chatroom] {
        &self.chatrooms
    }

    pub fn chatroom(&self, id: ChatroomId) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|c| c.id == id)
    }

    pub(crate) fn clear(&mut self) {
        self.chatrooms.clear();
    }
}
