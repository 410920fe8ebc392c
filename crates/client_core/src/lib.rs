use std::sync::{Arc, Weak};

use shared::{
    domain::{Channel, ChannelId, ChannelRename},
    protocol::{NewMessageRequest, ServerEvent},
};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod profanity;
pub mod realtime;
pub mod session;
pub mod store;
pub mod validation;

pub use error::{AuthError, CommandError, CommandKind, GatewayError};
pub use gateway::{ChatGateway, HttpGateway};
pub use profanity::{PassthroughFilter, ProfanityFilter, WordListFilter};
pub use realtime::{RealtimeHandle, RealtimeSignal};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use store::{ChatSnapshot, ChatState, LoadStatus, StoreAction};

use validation::validate_channel_name;

const EVENT_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// The store changed; call [`ChatClient::snapshot`] to re-render.
    StateChanged,
    /// A push event as received, before it is applied.
    Server(ServerEvent),
    RealtimeClosed,
    Error(String),
}

/// Proof that the user was asked to confirm a removal. Only
/// [`ChatClient::request_channel_removal`] creates one, and
/// [`ChatClient::confirm_channel_removal`] consumes it; dropping it cancels.
#[derive(Debug)]
pub struct RemovalRequest {
    channel_id: ChannelId,
    channel_name: String,
}

impl RemovalRequest {
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }
}

/// One mounted chat view: the store, the REST gateway it drives, and at most
/// one realtime connection feeding it.
pub struct ChatClient {
    gateway: Arc<dyn ChatGateway>,
    filter: Arc<dyn ProfanityFilter>,
    session: Session,
    state: Mutex<ChatState>,
    realtime: Mutex<Option<RealtimeHandle>>,
    events: broadcast::Sender<ClientEvent>,
}

impl ChatClient {
    pub fn new(gateway: Arc<dyn ChatGateway>, session: Session) -> Arc<Self> {
        Self::new_with_filter(gateway, session, Arc::new(PassthroughFilter))
    }

    pub fn new_with_filter(
        gateway: Arc<dyn ChatGateway>,
        session: Session,
        filter: Arc<dyn ProfanityFilter>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Arc::new(Self {
            gateway,
            filter,
            session,
            state: Mutex::new(ChatState::new()),
            realtime: Mutex::new(None),
            events,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ChatState {
        self.state.lock().await.clone()
    }

    /// Runs one store transition and notifies subscribers if it changed
    /// anything.
    pub async fn apply(&self, action: StoreAction) -> bool {
        let changed = self.state.lock().await.apply(action);
        if changed {
            let _ = self.events.send(ClientEvent::StateChanged);
        }
        changed
    }

    /// Fetches channels and messages together. Either failing fails the load.
    pub async fn load_initial(&self) -> ChatState {
        self.apply(StoreAction::LoadStarted).await;

        let result = futures::try_join!(
            self.gateway.list_channels(&self.session),
            self.gateway.list_messages(&self.session),
        );

        match result {
            Ok((channels, messages)) => {
                info!(
                    channels = channels.len(),
                    messages = messages.len(),
                    "chat: initial data loaded"
                );
                self.apply(StoreAction::LoadSucceeded(ChatSnapshot { channels, messages })).await;
            }
            Err(err) => {
                error!("chat: initial load failed: {err}");
                let message = format!("failed to load chat data: {err}");
                self.apply(StoreAction::LoadFailed(message.clone())).await;
                let _ = self.events.send(ClientEvent::Error(message));
            }
        }

        self.snapshot().await
    }

    pub async fn select_channel(&self, channel_id: ChannelId) {
        self.apply(StoreAction::SelectChannel(channel_id)).await;
    }

    pub async fn dispatch_server_event(&self, event: ServerEvent) -> bool {
        let _ = self.events.send(ClientEvent::Server(event.clone()));
        self.apply(StoreAction::from(event)).await
    }

    /// Sends a message to the selected channel. The store only learns about it
    /// from the realtime echo.
    pub async fn send_message(&self, text: &str) -> Result<(), CommandError> {
        let body = self.filter.clean(text.trim());
        if body.trim().is_empty() {
            return Err(CommandError::EmptyMessage);
        }

        let channel_id = self
            .state
            .lock()
            .await
            .current_channel_id
            .clone()
            .ok_or(CommandError::NoChannelSelected)?;

        let request = NewMessageRequest {
            body,
            channel_id: channel_id.clone(),
            username: self.session.username.clone(),
        };
        self.gateway
            .post_message(&self.session, &request)
            .await
            .map_err(CommandError::request(CommandKind::SendMessage))?;

        info!(channel_id = %channel_id, "chat: message sent");
        Ok(())
    }

    pub async fn create_channel(&self, name: &str) -> Result<Channel, CommandError> {
        let name = {
            let state = self.state.lock().await;
            validate_channel_name(name, &state.channels, None)?
        };
        let name = self.filter.clean(&name);

        let channel = self
            .gateway
            .create_channel(&self.session, &name)
            .await
            .map_err(CommandError::request(CommandKind::CreateChannel))?;

        info!(channel_id = %channel.id, name = %channel.name, "chat: channel created");
        self.apply(StoreAction::AddChannel(channel.clone())).await;
        self.apply(StoreAction::SelectChannel(channel.id.clone())).await;
        Ok(channel)
    }

    pub async fn rename_channel(
        &self,
        channel_id: &ChannelId,
        name: &str,
    ) -> Result<Channel, CommandError> {
        let name = {
            let state = self.state.lock().await;
            let channel = state
                .channel(channel_id)
                .ok_or_else(|| CommandError::ChannelNotFound(channel_id.clone()))?;
            if !channel.removable {
                return Err(CommandError::ChannelNotRemovable(channel_id.clone()));
            }
            validate_channel_name(name, &state.channels, Some(channel_id))?
        };
        let name = self.filter.clean(&name);

        let channel = self
            .gateway
            .rename_channel(&self.session, channel_id, &name)
            .await
            .map_err(CommandError::request(CommandKind::RenameChannel))?;

        info!(channel_id = %channel.id, name = %channel.name, "chat: channel renamed");
        self.apply(StoreAction::RenameChannel(ChannelRename::from(channel.clone()))).await;
        Ok(channel)
    }

    /// First step of a removal: checks the channel may be removed and hands
    /// back the confirmation the view must present. Sends nothing.
    pub async fn request_channel_removal(
        &self,
        channel_id: &ChannelId,
    ) -> Result<RemovalRequest, CommandError> {
        let state = self.state.lock().await;
        let channel = state
            .channel(channel_id)
            .ok_or_else(|| CommandError::ChannelNotFound(channel_id.clone()))?;
        if !channel.removable {
            return Err(CommandError::ChannelNotRemovable(channel_id.clone()));
        }
        Ok(RemovalRequest {
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
        })
    }

    pub async fn confirm_channel_removal(
        &self,
        request: RemovalRequest,
    ) -> Result<(), CommandError> {
        self.gateway
            .remove_channel(&self.session, &request.channel_id)
            .await
            .map_err(CommandError::request(CommandKind::RemoveChannel))?;

        info!(channel_id = %request.channel_id, "chat: channel removed");
        self.apply(StoreAction::RemoveChannel(request.channel_id)).await;
        Ok(())
    }

    /// Opens the realtime connection for this view, replacing any previous
    /// one.
    pub async fn connect_realtime(self: &Arc<Self>, server_url: &str) -> anyhow::Result<()> {
        let stream = realtime::open_event_stream(server_url).await?;
        self.attach_event_stream(stream.signals, Some(stream.reader)).await;
        Ok(())
    }

    pub async fn attach_event_stream(
        self: &Arc<Self>,
        signals: mpsc::Receiver<RealtimeSignal>,
        reader: Option<JoinHandle<()>>,
    ) {
        let dispatcher = self.spawn_dispatch_loop(signals);
        let previous = self
            .realtime
            .lock()
            .await
            .replace(RealtimeHandle::new(reader, dispatcher));
        if let Some(previous) = previous {
            warn!("realtime: replacing existing connection");
            previous.close();
        }
    }

    pub async fn disconnect_realtime(&self) {
        let handle = self.realtime.lock().await.take();
        if let Some(handle) = handle {
            handle.close();
            info!("realtime: disconnected");
        }
    }

    // Holds only a weak reference so a dropped view is not kept alive by its
    // own connection.
    fn spawn_dispatch_loop(
        self: &Arc<Self>,
        mut signals: mpsc::Receiver<RealtimeSignal>,
    ) -> JoinHandle<()> {
        let client: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                let Some(client) = client.upgrade() else {
                    return;
                };
                match signal {
                    RealtimeSignal::Event(event) => {
                        client.dispatch_server_event(event).await;
                    }
                    RealtimeSignal::Malformed(reason) => {
                        let _ = client
                            .events
                            .send(ClientEvent::Error(format!("invalid server event: {reason}")));
                    }
                    RealtimeSignal::Closed => break,
                }
            }

            if let Some(client) = client.upgrade() {
                let _ = client.events.send(ClientEvent::RealtimeClosed);
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
