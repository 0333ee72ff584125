use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Error body returned by the task backend. Framework errors put the reason in
/// `detail` (a string, or a list of field errors for request validation);
/// application envelopes use `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn from_slice(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub fn user_message(&self) -> Option<String> {
        if let Some(detail) = self.detail.as_ref().and_then(detail_message) {
            return Some(detail);
        }
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    }
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

pub fn message_from_body(body: &[u8]) -> String {
    ErrorBody::from_slice(body)
        .and_then(|parsed| parsed.user_message())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
