use serde::{Deserialize, Serialize};

use crate::domain::{Channel, ChannelId, ChannelRename, Message};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
}

/// Body of `POST /channels` and `PATCH /channels/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelNameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageRequest {
    pub body: String,
    pub channel_id: ChannelId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: ChannelId,
}

/// Push events delivered over the realtime connection. On the socket these
/// arrive as `["newMessage", {...}]`; the codec lifts the pair into the
/// `{type, payload}` shape this enum is tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerEvent {
    NewMessage(Message),
    NewChannel(Channel),
    RemoveChannel(ChannelRef),
    RenameChannel(ChannelRename),
}

impl ServerEvent {
    pub const NAMES: [&'static str; 4] =
        ["newMessage", "newChannel", "removeChannel", "renameChannel"];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "newMessage",
            Self::NewChannel(_) => "newChannel",
            Self::RemoveChannel(_) => "removeChannel",
            Self::RenameChannel(_) => "renameChannel",
        }
    }
}
