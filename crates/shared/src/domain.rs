use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the permanent fallback channel every server provides.
pub const DEFAULT_CHANNEL_NAME: &str = "general";

/// Ids are opaque to the client. The server may send them as JSON strings or
/// integers; both decode to the same textual id.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => text,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }
    };
}

id_newtype!(ChannelId);
id_newtype!(MessageId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub removable: bool,
}

impl Channel {
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_CHANNEL_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub username: String,
    pub body: String,
}

/// Payload of a rename, both as a realtime event and as the store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRename {
    pub id: ChannelId,
    pub name: String,
}

impl From<Channel> for ChannelRename {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name,
        }
    }
}
