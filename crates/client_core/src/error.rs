use shared::domain::ChannelId;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("server responded with status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|status| (400..500).contains(&status))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    SendMessage,
    CreateChannel,
    RenameChannel,
    RemoveChannel,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
            Self::CreateChannel => "create_channel",
            Self::RenameChannel => "rename_channel",
            Self::RemoveChannel => "remove_channel",
        }
    }

    pub fn failure_key(self) -> &'static str {
        match self {
            Self::SendMessage => "chat.sendError",
            Self::CreateChannel => "channels.addError",
            Self::RenameChannel => "channels.renameError",
            Self::RemoveChannel => "channels.removeError",
        }
    }
}

/// Failure of a user command. None of these mutate the store.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("message body is empty")]
    EmptyMessage,
    #[error("no channel selected")]
    NoChannelSelected,
    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),
    #[error("channel {0} is permanent")]
    ChannelNotRemovable(ChannelId),
    #[error("{} failed: {source}", command.as_str())]
    Request {
        command: CommandKind,
        #[source]
        source: GatewayError,
    },
}

impl CommandError {
    pub fn request(command: CommandKind) -> impl FnOnce(GatewayError) -> Self {
        move |source| Self::Request { command, source }
    }

    /// Key into the view layer's message catalogue.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.message_key(),
            Self::EmptyMessage => "validation.required",
            Self::NoChannelSelected => "chat.noChannel",
            Self::ChannelNotFound(_) => "channels.notFound",
            Self::ChannelNotRemovable(_) => "channels.permanent",
            Self::Request { command, .. } => command.failure_key(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Login,
    Signup,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("{flow:?} rejected with status {status}")]
    Rejected { flow: AuthFlow, status: u16 },
    #[error("server unavailable: {0}")]
    Unavailable(#[source] GatewayError),
    #[error("failed to persist session: {0}")]
    Persist(#[source] anyhow::Error),
}

impl AuthError {
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.message_key(),
            Self::InvalidCredentials => "auth.loginError",
            Self::UsernameTaken => "auth.signupConflict",
            Self::Rejected {
                flow: AuthFlow::Login,
                ..
            } => "auth.loginError",
            Self::Rejected {
                flow: AuthFlow::Signup,
                ..
            } => "auth.signupError",
            Self::Unavailable(_) => "errors.network",
            Self::Persist(_) => "errors.storage",
        }
    }
}
