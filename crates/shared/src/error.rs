use serde::{Deserialize, Serialize};

/// Error body the REST API attaches to non-2xx responses. Every field is
/// optional because proxies and older servers answer with plain text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|body| body.error.is_some() || body.message.is_some())
    }

    pub fn summary(&self) -> String {
        match (&self.error, &self.message) {
            (Some(error), Some(message)) if error != message => format!("{error}: {message}"),
            (_, Some(message)) => message.clone(),
            (Some(error), None) => error.clone(),
            (None, None) => String::new(),
        }
    }
}
