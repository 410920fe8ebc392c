use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use client_core::{
    store::{ChatState, LoadStatus},
    ChatClient, ClientEvent, CommandError, RemovalRequest,
};
use shared::domain::{Channel, Message, MessageId};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::warn;

const HISTORY_LIMIT: usize = 20;

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Channels,
    Join(&'a str),
    Create(&'a str),
    Rename { from: &'a str, to: &'a str },
    Remove(&'a str),
    History,
    Help,
    Quit,
    Say(&'a str),
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return Input::Say(line);
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));
    match name {
        "channels" => Input::Channels,
        "join" => Input::Join(rest),
        "create" => Input::Create(rest),
        "rename" => match rest.split_once(char::is_whitespace) {
            Some((from, to)) => Input::Rename {
                from,
                to: to.trim(),
            },
            None => Input::Unknown(line),
        },
        "remove" => Input::Remove(rest),
        "history" => Input::History,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => Input::Unknown(line),
    }
}

fn is_confirmation(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

pub async fn run(client: Arc<ChatClient>, server_url: &str) -> Result<()> {
    let mut events = client.subscribe_events();

    if client.snapshot().await.load_status == LoadStatus::NotStarted {
        let state = client.load_initial().await;
        if state.load_status == LoadStatus::Failed {
            println!("! errors.loadFailed: channels and messages could not be loaded");
        }
    }
    if let Err(err) = client.connect_realtime(server_url).await {
        warn!("realtime: connect failed: {err:#}");
        println!("! errors.network: live updates unavailable");
    }

    print_channels(&client.snapshot().await);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_removal: Option<RemovalRequest> = None;
    let mut seen_messages: HashSet<MessageId> = client
        .snapshot()
        .await
        .messages
        .iter()
        .map(|message| message.id.clone())
        .collect();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(request) = pending_removal.take() {
                    if is_confirmation(&line) {
                        let name = request.channel_name().to_string();
                        match client.confirm_channel_removal(request).await {
                            Ok(()) => println!("removed #{name}"),
                            Err(err) => report(&err),
                        }
                    } else {
                        println!("kept #{}", request.channel_name());
                    }
                    continue;
                }
                if !handle_line(&client, &line, &mut pending_removal).await {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(ClientEvent::Server(event)) => {
                    tracing::debug!(event = event.name(), "chat: push event");
                }
                Ok(ClientEvent::StateChanged) => {
                    let state = client.snapshot().await;
                    for message in unseen_in_current_channel(&state, &mut seen_messages) {
                        println!("<{}> {}", message.username, message.body);
                    }
                }
                Ok(ClientEvent::RealtimeClosed) => println!("! live updates stopped"),
                Ok(ClientEvent::Error(message)) => println!("! {message}"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "chat: missed client events"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    client.disconnect_realtime().await;
    Ok(())
}

// Returns false when the user asked to leave.
async fn handle_line(
    client: &ChatClient,
    line: &str,
    pending_removal: &mut Option<RemovalRequest>,
) -> bool {
    match parse_input(line.trim()) {
        Input::Channels => print_channels(&client.snapshot().await),
        Input::Join(name) => match client.snapshot().await.channel_by_name(name) {
            Some(channel) => {
                client.select_channel(channel.id.clone()).await;
                print_history(&client.snapshot().await);
            }
            None => println!("! channels.notFound: {name}"),
        },
        Input::Create(name) => match client.create_channel(name).await {
            Ok(channel) => println!("created #{}", channel.name),
            Err(err) => report(&err),
        },
        Input::Rename { from, to } => {
            let Some(channel) = find_channel(client, from).await else {
                return true;
            };
            match client.rename_channel(&channel.id, to).await {
                Ok(channel) => println!("renamed to #{}", channel.name),
                Err(err) => report(&err),
            }
        }
        Input::Remove(name) => {
            let Some(channel) = find_channel(client, name).await else {
                return true;
            };
            match client.request_channel_removal(&channel.id).await {
                Ok(request) => {
                    println!("remove #{}? [y/N]", request.channel_name());
                    *pending_removal = Some(request);
                }
                Err(err) => report(&err),
            }
        }
        Input::History => print_history(&client.snapshot().await),
        Input::Help => print_help(),
        Input::Quit => return false,
        Input::Say(text) => {
            if let Err(err) = client.send_message(text).await {
                report(&err);
            }
        }
        Input::Unknown(line) => println!("! unknown command: {line}"),
    }
    true
}

async fn find_channel(client: &ChatClient, name: &str) -> Option<Channel> {
    let channel = client.snapshot().await.channel_by_name(name).cloned();
    if channel.is_none() {
        println!("! channels.notFound: {name}");
    }
    channel
}

fn report(err: &CommandError) {
    println!("! {}: {err}", err.message_key());
}

fn print_help() {
    println!("/channels  /join <name>  /create <name>  /rename <name> <new>  /remove <name>");
    println!("/history  /quit  (anything else is sent to the current channel)");
}

fn print_channels(state: &ChatState) {
    for channel in &state.channels {
        let marker = if state.current_channel_id.as_ref() == Some(&channel.id) {
            '*'
        } else {
            ' '
        };
        let lock = if channel.removable { "" } else { " (permanent)" };
        println!(
            "{marker} #{} [{}]{lock}",
            channel.name,
            state.message_count(&channel.id)
        );
    }
}

fn print_history(state: &ChatState) {
    let Some(channel) = state.current_channel() else {
        println!("! no channel selected");
        return;
    };
    println!("-- #{} --", channel.name);
    let messages: Vec<_> = state.messages_in(&channel.id).collect();
    let start = messages.len().saturating_sub(HISTORY_LIMIT);
    for message in &messages[start..] {
        println!("<{}> {}", message.username, message.body);
    }
}

// Marks every message in `state` as seen and returns the new ones that
// belong to the selected channel.
fn unseen_in_current_channel<'a>(
    state: &'a ChatState,
    seen: &mut HashSet<MessageId>,
) -> Vec<&'a Message> {
    let current = state.current_channel_id.as_ref();
    state
        .messages
        .iter()
        .filter(|message| seen.insert(message.id.clone()))
        .filter(|message| Some(&message.channel_id) == current)
        .collect()
}
