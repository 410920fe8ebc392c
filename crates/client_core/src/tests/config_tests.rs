use super::*;

use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_from(&dir.path().join("absent.toml"), no_env);
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("client.toml");
    fs::write(
        &path,
        "server_url = \"https://chat.example.com\"\nrequest_timeout_secs = 30\n",
    )
    .expect("write");

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.server_url, "https://chat.example.com");
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.session_file, ClientSettings::default().session_file);
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("client.toml");
    fs::write(&path, "server_url = \"http://from-file\"\n").expect("write");

    let env: HashMap<&str, &str> = HashMap::from([
        ("CHAT_SERVER_URL", "http://from-chat-env"),
        ("APP__SERVER_URL", "http://from-app-env"),
        ("CHAT_SESSION_FILE", "/tmp/session.json"),
        ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
    ]);
    let settings = load_settings_from(&path, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_url, "http://from-app-env");
    assert_eq!(settings.session_file, PathBuf::from("/tmp/session.json"));
    assert_eq!(settings.request_timeout_secs, 15);
}

#[test]
fn unreadable_file_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("client.toml");
    fs::write(&path, "server_url = [").expect("write");
    assert_eq!(load_settings_from(&path, no_env), ClientSettings::default());
}

#[test]
fn request_timeout_is_never_zero() {
    let settings = ClientSettings {
        request_timeout_secs: 0,
        ..ClientSettings::default()
    };
    assert_eq!(settings.request_timeout(), Duration::from_secs(1));
}

#[test]
fn profanity_word_list_comes_from_file_then_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("client.toml");
    fs::write(&path, "profanity_words_file = \"/etc/hexchat/words.txt\"\n").expect("write");

    let settings = load_settings_from(&path, no_env);
    assert_eq!(
        settings.profanity_words_file,
        Some(PathBuf::from("/etc/hexchat/words.txt"))
    );

    let settings = load_settings_from(&path, |key| {
        (key == "APP__PROFANITY_WORDS_FILE").then(|| "/tmp/words.txt".to_string())
    });
    assert_eq!(
        settings.profanity_words_file,
        Some(PathBuf::from("/tmp/words.txt"))
    );
}

#[test]
fn configured_word_list_masks_outgoing_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let words = dir.path().join("words.txt");
    fs::write(&words, "shit\n").expect("write");
    let settings = ClientSettings {
        profanity_words_file: Some(words),
        ..ClientSettings::default()
    };

    let filter = settings.profanity_filter().expect("filter");
    assert_eq!(filter.clean("what the shit"), "what the ****");
}

#[test]
fn no_word_list_leaves_text_alone() {
    let filter = ClientSettings::default().profanity_filter().expect("filter");
    assert_eq!(filter.clean("what the shit"), "what the shit");
}

#[test]
fn unreadable_word_list_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = ClientSettings {
        profanity_words_file: Some(dir.path().join("absent.txt")),
        ..ClientSettings::default()
    };
    assert!(settings.profanity_filter().is_err());
}
