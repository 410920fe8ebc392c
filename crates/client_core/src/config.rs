use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

use crate::{
    profanity::{PassthroughFilter, ProfanityFilter, WordListFilter},
    session::default_session_path,
};

pub const DEFAULT_SETTINGS_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub session_file: PathBuf,
    pub request_timeout_secs: u64,
    /// Word list for outgoing text. `None` sends text unfiltered.
    pub profanity_words_file: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5001".into(),
            session_file: default_session_path(),
            request_timeout_secs: 15,
            profanity_words_file: None,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn profanity_filter(&self) -> Result<Arc<dyn ProfanityFilter>> {
        match &self.profanity_words_file {
            Some(path) => Ok(Arc::new(WordListFilter::from_file(path)?)),
            None => Ok(Arc::new(PassthroughFilter)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    session_file: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    profanity_words_file: Option<PathBuf>,
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(DEFAULT_SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), "config: ignoring unreadable settings file: {err}"),
        }
    }

    apply_env_overrides(&mut settings, env);
    settings
}

fn apply_file_settings(settings: &mut ClientSettings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.session_file {
        settings.session_file = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.profanity_words_file {
        settings.profanity_words_file = Some(v);
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("CHAT_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("CHAT_SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }
    if let Some(v) = env("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }

    if let Some(v) = env("CHAT_PROFANITY_WORDS_FILE") {
        settings.profanity_words_file = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__PROFANITY_WORDS_FILE") {
        settings.profanity_words_file = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => warn!(value = %v, "config: ignoring invalid APP__REQUEST_TIMEOUT_SECS"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
