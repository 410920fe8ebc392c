use super::*;
use shared::domain::MessageId;

fn channel(id: i64, name: &str, removable: bool) -> Channel {
    Channel {
        id: ChannelId::from(id),
        name: name.to_string(),
        removable,
    }
}

fn message(id: i64, channel_id: i64, body: &str) -> Message {
    Message {
        id: MessageId::from(id),
        channel_id: ChannelId::from(channel_id),
        username: "admin".to_string(),
        body: body.to_string(),
    }
}

fn loaded_state(channels: Vec<Channel>, messages: Vec<Message>) -> ChatState {
    let mut state = ChatState::new();
    state.apply(StoreAction::LoadStarted);
    state.apply(StoreAction::LoadSucceeded(ChatSnapshot { channels, messages }));
    state
}

#[test]
fn initial_load_selects_general() {
    let state = loaded_state(
        vec![channel(1, "general", false), channel(2, "random", true)],
        Vec::new(),
    );
    assert_eq!(state.load_status, LoadStatus::Loaded);
    assert_eq!(state.current_channel_id, Some(ChannelId::from(1)));
}

#[test]
fn initial_load_prefers_general_over_first_channel() {
    let state = loaded_state(
        vec![channel(2, "random", true), channel(1, "general", false)],
        Vec::new(),
    );
    assert_eq!(state.current_channel_id, Some(ChannelId::from(1)));
}

#[test]
fn initial_load_falls_back_to_first_then_none() {
    let state = loaded_state(
        vec![channel(4, "news", true), channel(5, "misc", true)],
        Vec::new(),
    );
    assert_eq!(state.current_channel_id, Some(ChannelId::from(4)));

    let empty = loaded_state(Vec::new(), Vec::new());
    assert_eq!(empty.current_channel_id, None);
}

#[test]
fn initial_load_keeps_existing_selection() {
    let mut state = ChatState::new();
    state.apply(StoreAction::SelectChannel(ChannelId::from(2)));
    state.apply(StoreAction::LoadStarted);
    state.apply(StoreAction::LoadSucceeded(ChatSnapshot {
        channels: vec![channel(1, "general", false), channel(2, "random", true)],
        messages: Vec::new(),
    }));
    assert_eq!(state.current_channel_id, Some(ChannelId::from(2)));
}

#[test]
fn repeated_load_success_is_last_write_wins() {
    let mut state = loaded_state(vec![channel(1, "general", false)], Vec::new());
    let changed = state.apply(StoreAction::LoadSucceeded(ChatSnapshot {
        channels: vec![channel(1, "general", false), channel(9, "late", true)],
        messages: vec![message(1, 9, "hi")],
    }));
    assert!(changed);
    assert_eq!(state.channels.len(), 2);
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.load_status, LoadStatus::Loaded);
}

#[test]
fn load_failure_records_single_error() {
    let mut state = ChatState::new();
    state.apply(StoreAction::LoadStarted);
    assert_eq!(state.load_status, LoadStatus::Loading);
    state.apply(StoreAction::LoadFailed("Failed to load chat data".into()));
    assert_eq!(state.load_status, LoadStatus::Failed);
    assert_eq!(state.load_error.as_deref(), Some("Failed to load chat data"));
}

#[test]
fn failed_reload_keeps_loaded_status_and_data() {
    let mut state = loaded_state(
        vec![channel(1, "general", false)],
        vec![message(1, 1, "hello")],
    );
    assert!(!state.apply(StoreAction::LoadFailed("timeout".into())));
    assert_eq!(state.load_status, LoadStatus::Loaded);
    assert!(state.load_error.is_none());
    assert_eq!(state.message_count(&ChannelId::from(1)), 1);
}

#[test]
fn successful_reload_recovers_from_failure() {
    let mut state = ChatState::new();
    state.apply(StoreAction::LoadStarted);
    state.apply(StoreAction::LoadFailed("offline".into()));
    assert!(state.apply(StoreAction::LoadSucceeded(ChatSnapshot {
        channels: vec![channel(1, "general", false)],
        messages: Vec::new(),
    })));
    assert_eq!(state.load_status, LoadStatus::Loaded);
    assert!(state.load_error.is_none());
}

#[test]
fn load_started_is_ignored_once_terminal() {
    let mut state = loaded_state(vec![channel(1, "general", false)], Vec::new());
    assert!(!state.apply(StoreAction::LoadStarted));
    assert_eq!(state.load_status, LoadStatus::Loaded);
    assert!(state.load_status.is_terminal());
}

#[test]
fn add_channel_is_idempotent_by_id() {
    let mut state = loaded_state(vec![channel(1, "general", false)], Vec::new());
    assert!(state.apply(StoreAction::AddChannel(channel(5, "x", true))));
    assert!(!state.apply(StoreAction::AddChannel(channel(5, "x", true))));
    assert!(!state.apply(StoreAction::AddChannel(channel(5, "renamed", true))));
    assert!(state.apply(StoreAction::AddChannel(channel(6, "y", true))));

    let ids: Vec<_> = state.channels.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "5", "6"]);
}

#[test]
fn realtime_echo_then_create_response_keeps_one_channel() {
    let mut state = loaded_state(vec![channel(1, "general", false)], Vec::new());
    state.apply(StoreAction::AddChannel(channel(5, "x", true)));
    state.apply(StoreAction::AddChannel(channel(5, "x", true)));
    state.apply(StoreAction::SelectChannel(ChannelId::from(5)));

    let matching = state
        .channels
        .iter()
        .filter(|c| c.id == ChannelId::from(5))
        .count();
    assert_eq!(matching, 1);
    assert_eq!(state.current_channel().map(|c| c.name.as_str()), Some("x"));
}

#[test]
fn rename_updates_in_place_and_ignores_unknown_ids() {
    let mut state = loaded_state(
        vec![channel(1, "general", false), channel(2, "random", true)],
        Vec::new(),
    );
    let before = state.clone();
    assert!(!state.apply(StoreAction::RenameChannel(ChannelRename {
        id: ChannelId::from(42),
        name: "ghost".into(),
    })));
    assert_eq!(state, before);

    assert!(state.apply(StoreAction::RenameChannel(ChannelRename {
        id: ChannelId::from(2),
        name: "chatter".into(),
    })));
    assert_eq!(state.channels[1].name, "chatter");
    assert_eq!(state.channels[1].id, ChannelId::from(2));
}

#[test]
fn remove_cascades_messages() {
    let mut state = loaded_state(
        vec![channel(1, "general", false), channel(2, "random", true)],
        vec![message(1, 1, "a"), message(2, 2, "b"), message(3, 2, "c")],
    );
    assert!(state.apply(StoreAction::RemoveChannel(ChannelId::from(2))));
    assert_eq!(state.channels.len(), 1);
    assert_eq!(state.message_count(&ChannelId::from(2)), 0);
    assert_eq!(state.messages.len(), 1);
    assert!(state
        .messages
        .iter()
        .all(|m| state.channel(&m.channel_id).is_some()));
}

#[test]
fn message_for_removed_channel_arriving_late_is_kept_until_readded() {
    let mut state = loaded_state(
        vec![channel(1, "general", false), channel(2, "random", true)],
        vec![message(1, 2, "old")],
    );
    state.apply(StoreAction::RemoveChannel(ChannelId::from(2)));
    assert_eq!(state.message_count(&ChannelId::from(2)), 0);

    state.apply(StoreAction::AddMessage(message(2, 2, "late")));
    assert_eq!(state.message_count(&ChannelId::from(2)), 1);
    assert!(state.channel(&ChannelId::from(2)).is_none());
}

#[test]
fn removing_current_channel_reselects_general() {
    let mut state = loaded_state(
        vec![
            channel(3, "news", true),
            channel(1, "general", false),
            channel(2, "random", true),
        ],
        Vec::new(),
    );
    state.apply(StoreAction::SelectChannel(ChannelId::from(2)));
    state.apply(StoreAction::RemoveChannel(ChannelId::from(2)));
    assert_eq!(state.current_channel_id, Some(ChannelId::from(1)));
}

#[test]
fn removing_current_channel_without_general_picks_first_then_none() {
    let mut state = loaded_state(
        vec![channel(3, "news", true), channel(4, "misc", true)],
        Vec::new(),
    );
    state.apply(StoreAction::SelectChannel(ChannelId::from(4)));
    state.apply(StoreAction::RemoveChannel(ChannelId::from(4)));
    assert_eq!(state.current_channel_id, Some(ChannelId::from(3)));

    state.apply(StoreAction::RemoveChannel(ChannelId::from(3)));
    assert_eq!(state.current_channel_id, None);
}

#[test]
fn removing_other_channel_keeps_selection() {
    let mut state = loaded_state(
        vec![channel(1, "general", false), channel(2, "random", true), channel(3, "news", true)],
        Vec::new(),
    );
    state.apply(StoreAction::SelectChannel(ChannelId::from(3)));
    state.apply(StoreAction::RemoveChannel(ChannelId::from(2)));
    assert_eq!(state.current_channel_id, Some(ChannelId::from(3)));
}

#[test]
fn remove_unknown_channel_is_noop() {
    let mut state = loaded_state(vec![channel(1, "general", false)], vec![message(1, 1, "a")]);
    let before = state.clone();
    assert!(!state.apply(StoreAction::RemoveChannel(ChannelId::from(7))));
    assert_eq!(state, before);
}

#[test]
fn select_channel_stores_unknown_ids() {
    let mut state = loaded_state(vec![channel(1, "general", false)], Vec::new());
    state.apply(StoreAction::SelectChannel(ChannelId::from(99)));
    assert_eq!(state.current_channel_id, Some(ChannelId::from(99)));
    assert!(state.current_channel().is_none());
}

// The send flow never echoes locally; the realtime event is the only path a
// sent message takes into the store. If the send flow ever starts adding
// messages itself, this duplication becomes visible to users.
#[test]
fn add_message_does_not_deduplicate() {
    let mut state = loaded_state(vec![channel(1, "general", false)], Vec::new());
    state.apply(StoreAction::AddMessage(message(8, 1, "hello")));
    state.apply(StoreAction::AddMessage(message(8, 1, "hello")));
    assert_eq!(state.message_count(&ChannelId::from(1)), 2);
}

#[test]
fn messages_in_preserves_insertion_order() {
    let state = loaded_state(
        vec![channel(1, "general", false), channel(2, "random", true)],
        vec![message(1, 1, "a"), message(2, 2, "x"), message(3, 1, "b")],
    );
    let general = ChannelId::from(1);
    let bodies: Vec<_> = state.messages_in(&general).map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["a", "b"]);
}

#[test]
fn channel_by_name_is_case_insensitive() {
    let state = loaded_state(vec![channel(1, "General", false)], Vec::new());
    assert_eq!(
        state.channel_by_name(" general ").map(|c| c.id.clone()),
        Some(ChannelId::from(1))
    );
}
