//! Normalized chat state and the reducer that keeps it consistent.
//!
//! Three sources feed the store: the one-shot REST snapshot, results of the
//! user's own commands, and realtime push events. Every source is reduced to a
//! [`StoreAction`] and applied with [`ChatState::apply`], which never suspends,
//! so interleavings only ever observe whole transitions.

use shared::{
    domain::{Channel, ChannelId, ChannelRename, Message},
    protocol::ServerEvent,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

impl LoadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub channels: Vec<Channel>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    LoadStarted,
    LoadSucceeded(ChatSnapshot),
    LoadFailed(String),
    SelectChannel(ChannelId),
    AddChannel(Channel),
    RenameChannel(ChannelRename),
    RemoveChannel(ChannelId),
    AddMessage(Message),
}

/// Each push event maps to exactly one store mutation.
impl From<ServerEvent> for StoreAction {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::NewMessage(message) => Self::AddMessage(message),
            ServerEvent::NewChannel(channel) => Self::AddChannel(channel),
            ServerEvent::RemoveChannel(channel) => Self::RemoveChannel(channel.id),
            ServerEvent::RenameChannel(rename) => Self::RenameChannel(rename),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    pub channels: Vec<Channel>,
    pub messages: Vec<Message>,
    pub current_channel_id: Option<ChannelId>,
    pub load_status: LoadStatus,
    pub load_error: Option<String>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one transition. Returns `false` when the action was a no-op.
    pub fn apply(&mut self, action: StoreAction) -> bool {
        match action {
            StoreAction::LoadStarted => {
                if self.load_status != LoadStatus::NotStarted {
                    debug!(status = ?self.load_status, "store: load already started");
                    return false;
                }
                self.load_status = LoadStatus::Loading;
                self.load_error = None;
                true
            }
            StoreAction::LoadSucceeded(snapshot) => {
                self.channels = snapshot.channels;
                self.messages = snapshot.messages;
                self.load_status = LoadStatus::Loaded;
                self.load_error = None;
                if self.current_channel_id.is_none() {
                    self.current_channel_id = self.fallback_channel_id();
                }
                true
            }
            StoreAction::LoadFailed(error) => {
                if self.load_status == LoadStatus::Loaded {
                    debug!("store: failed reload ignored, keeping loaded data");
                    return false;
                }
                self.load_status = LoadStatus::Failed;
                self.load_error = Some(error);
                true
            }
            StoreAction::SelectChannel(id) => {
                if self.current_channel_id.as_ref() == Some(&id) {
                    return false;
                }
                self.current_channel_id = Some(id);
                true
            }
            StoreAction::AddChannel(channel) => self.add_channel(channel),
            StoreAction::RenameChannel(rename) => self.rename_channel(rename),
            StoreAction::RemoveChannel(id) => self.remove_channel(&id),
            StoreAction::AddMessage(message) => {
                self.messages.push(message);
                true
            }
        }
    }

    fn add_channel(&mut self, channel: Channel) -> bool {
        if self.channel(&channel.id).is_some() {
            debug!(channel_id = %channel.id, "store: duplicate channel ignored");
            return false;
        }
        self.channels.push(channel);
        true
    }

    fn rename_channel(&mut self, rename: ChannelRename) -> bool {
        let Some(channel) = self.channels.iter_mut().find(|c| c.id == rename.id) else {
            debug!(channel_id = %rename.id, "store: rename for unknown channel ignored");
            return false;
        };
        if channel.name == rename.name {
            return false;
        }
        channel.name = rename.name;
        true
    }

    fn remove_channel(&mut self, id: &ChannelId) -> bool {
        let before = self.channels.len();
        self.channels.retain(|channel| &channel.id != id);
        if self.channels.len() == before {
            debug!(channel_id = %id, "store: remove for unknown channel ignored");
            return false;
        }

        self.messages.retain(|message| &message.channel_id != id);
        if self.current_channel_id.as_ref() == Some(id) {
            self.current_channel_id = self.fallback_channel_id();
        }
        true
    }

    /// "general" if present, else the first channel in order.
    pub fn fallback_channel_id(&self) -> Option<ChannelId> {
        self.channels
            .iter()
            .find(|channel| channel.is_default())
            .or_else(|| self.channels.first())
            .map(|channel| channel.id.clone())
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|channel| &channel.id == id)
    }

    pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
        let wanted = name.trim().to_lowercase();
        self.channels
            .iter()
            .find(|channel| channel.name.to_lowercase() == wanted)
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.current_channel_id
            .as_ref()
            .and_then(|id| self.channel(id))
    }

    pub fn messages_in<'a>(&'a self, id: &'a ChannelId) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages
            .iter()
            .filter(move |message| &message.channel_id == id)
    }

    pub fn message_count(&self, id: &ChannelId) -> usize {
        self.messages_in(id).count()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
