//! Realtime push connection.
//!
//! The server speaks Socket.IO v4 over a plain WebSocket. A reader task
//! decodes frames, answers heartbeats, and forwards decoded events into an
//! `mpsc` queue; the client's dispatch loop drains that queue into the store.

use anyhow::{anyhow, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use shared::protocol::ServerEvent;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

pub const SOCKET_IO_PATH: &str = "/socket.io/";
const SOCKET_IO_QUERY: &str = "EIO=4&transport=websocket";
const EVENT_QUEUE_CAPACITY: usize = 256;

const NAMESPACE_CONNECT: &str = "40";
const PONG: &str = "3";

/// One decoded Engine.IO / Socket.IO text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Engine.IO handshake; the client must connect the default namespace.
    Open(Value),
    Close,
    Ping,
    Pong,
    Noop,
    /// Socket.IO namespace connect acknowledgement.
    Connected,
    Disconnected,
    ConnectError(String),
    Event(ServerEvent),
    UnknownEvent(String),
    /// Acks and binary packets; this client never requests either.
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownType(String),
    #[error("malformed event frame: {0}")]
    MalformedEvent(String),
    #[error("invalid {event} payload: {reason}")]
    Payload { event: String, reason: String },
}

pub fn decode_packet(frame: &str) -> Result<Packet, FrameError> {
    let mut chars = frame.chars();
    let engine_type = chars.next().ok_or(FrameError::Empty)?;
    let rest = chars.as_str();

    match engine_type {
        '0' => Ok(Packet::Open(serde_json::from_str(rest).unwrap_or(Value::Null))),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '6' => Ok(Packet::Noop),
        '4' => decode_socket_packet(rest),
        other => Err(FrameError::UnknownType(other.to_string())),
    }
}

fn decode_socket_packet(frame: &str) -> Result<Packet, FrameError> {
    let mut chars = frame.chars();
    let socket_type = chars.next().ok_or(FrameError::Empty)?;
    let rest = strip_namespace(chars.as_str());

    match socket_type {
        '0' => Ok(Packet::Connected),
        '1' => Ok(Packet::Disconnected),
        '2' => decode_event(rest),
        '3' | '5' | '6' => Ok(Packet::Ignored),
        '4' => Ok(Packet::ConnectError(rest.to_string())),
        other => Err(FrameError::UnknownType(format!("4{other}"))),
    }
}

/// Drops a `/namespace,` prefix; the client only uses the default namespace.
fn strip_namespace(frame: &str) -> &str {
    if frame.starts_with('/') {
        frame.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        frame
    }
}

fn decode_event(frame: &str) -> Result<Packet, FrameError> {
    // Optional ack id precedes the argument array.
    let body = frame.trim_start_matches(|c: char| c.is_ascii_digit());
    let args: Vec<Value> =
        serde_json::from_str(body).map_err(|err| FrameError::MalformedEvent(err.to_string()))?;
    let mut args = args.into_iter();
    let name = match args.next() {
        Some(Value::String(name)) => name,
        _ => return Err(FrameError::MalformedEvent("missing event name".into())),
    };

    if !ServerEvent::NAMES.contains(&name.as_str()) {
        return Ok(Packet::UnknownEvent(name));
    }

    let payload = args.next().unwrap_or(Value::Null);
    serde_json::from_value(serde_json::json!({ "type": name, "payload": payload }))
        .map(Packet::Event)
        .map_err(|err| FrameError::Payload {
            event: name,
            reason: err.to_string(),
        })
}

/// Derives the realtime endpoint from the REST base URL.
pub fn socket_url(server_url: &str) -> Result<Url> {
    let mut url = Url::parse(server_url)
        .with_context(|| format!("invalid server url: {server_url}"))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(anyhow!("unsupported server url scheme: {other}")),
    };
    url.set_scheme(scheme)
        .map_err(|()| anyhow!("cannot switch {server_url} to {scheme}"))?;
    url.set_path(SOCKET_IO_PATH);
    url.set_query(Some(SOCKET_IO_QUERY));
    url.set_fragment(None);
    Ok(url)
}

/// What the reader task hands to the dispatch loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeSignal {
    Event(ServerEvent),
    Malformed(String),
    Closed,
}

pub struct EventStream {
    pub signals: mpsc::Receiver<RealtimeSignal>,
    pub reader: JoinHandle<()>,
}

/// Connects to the realtime endpoint and starts the reader task.
pub async fn open_event_stream(server_url: &str) -> Result<EventStream> {
    let url = socket_url(server_url)?;
    let (ws_stream, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect websocket: {url}"))?;
    info!(url = %url, "realtime: connected");

    let (mut ws_writer, mut ws_reader) = ws_stream.split();
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    let reader = tokio::spawn(async move {
        while let Some(msg) = ws_reader.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(err) => {
                    warn!("realtime: websocket receive failed: {err}");
                    break;
                }
            };

            let packet = match decode_packet(&text) {
                Ok(packet) => packet,
                Err(err) => {
                    warn!("realtime: dropping frame: {err}");
                    if tx.send(RealtimeSignal::Malformed(err.to_string())).await.is_err() {
                        return;
                    }
                    continue;
                }
            };

            let reply = match packet {
                Packet::Open(_) => Some(NAMESPACE_CONNECT),
                Packet::Ping => Some(PONG),
                Packet::Event(event) => {
                    debug!(event = event.name(), "realtime: event received");
                    if tx.send(RealtimeSignal::Event(event)).await.is_err() {
                        return;
                    }
                    None
                }
                Packet::UnknownEvent(name) => {
                    debug!(event = %name, "realtime: ignoring unknown event");
                    None
                }
                Packet::Connected => {
                    info!("realtime: namespace connected");
                    None
                }
                Packet::ConnectError(reason) => {
                    warn!("realtime: namespace connect refused: {reason}");
                    break;
                }
                Packet::Close | Packet::Disconnected => break,
                Packet::Pong | Packet::Noop | Packet::Ignored => None,
            };

            if let Some(reply) = reply {
                if let Err(err) = ws_writer.send(Message::Text(reply.into())).await {
                    warn!("realtime: websocket send failed: {err}");
                    break;
                }
            }
        }

        let _ = ws_writer.close().await;
        let _ = tx.send(RealtimeSignal::Closed).await;
        info!("realtime: connection closed");
    });

    Ok(EventStream { signals: rx, reader })
}

/// Owns the background tasks of one realtime connection. Dropping the handle
/// aborts both, which closes the socket.
pub struct RealtimeHandle {
    reader: Option<JoinHandle<()>>,
    dispatcher: JoinHandle<()>,
}

impl RealtimeHandle {
    pub fn new(reader: Option<JoinHandle<()>>, dispatcher: JoinHandle<()>) -> Self {
        Self { reader, dispatcher }
    }

    pub fn is_finished(&self) -> bool {
        self.dispatcher.is_finished()
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        if let Some(reader) = &self.reader {
            reader.abort();
        }
        self.dispatcher.abort();
    }
}

#[cfg(test)]
#[path = "tests/realtime_tests.rs"]
mod tests;
