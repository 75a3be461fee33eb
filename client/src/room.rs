use std::collections::BTreeSet;

use chatsync_protocol::{ChatroomId, ChatroomRecord, MessageRecord, UserId, UserRecord};

/// A chatroom visible to the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chatroom {
    pub id: ChatroomId,
    pub name: Option<String>,
    pub member_ids: BTreeSet<UserId>,
}

impl Chatroom {
    /// The room name, or `Chatroom {id}` when it has none
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Chatroom {}", self.id),
        }
    }
}

impl From<ChatroomRecord> for Chatroom {
    fn from(record: ChatroomRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            member_ids: record.users.iter().map(|m| m.id()).collect(),
        }
    }
}

/// Directory entry used to pick chatroom members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
        }
    }
}

/// One message as delivered by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Index in the server's order for this fetch
    pub position: usize,
    pub sender_id: Option<UserId>,
    pub sender_display_name: String,
    pub content: String,
    pub chatroom_id: ChatroomId,
}

impl Message {
    pub(crate) fn from_record(chatroom_id: ChatroomId, position: usize, record: MessageRecord) -> Self {
        let sender_display_name = match record.sender.first_name.trim() {
            "" => "Unknown".to_string(),
            name => name.to_string(),
        };

        Self {
            position,
            sender_id: record.sender.id,
            sender_display_name,
            content: record.content,
            chatroom_id,
        }
    }
}
