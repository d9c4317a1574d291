//! Message model and content standardization
//!
//! Two on-disk record shapes feed this model:
//! - `api_conversation_history.json`: `{role, content, ts?}` where content
//!   is a string, an array of typed parts, or an arbitrary object
//! - `ui_messages.json`: `{say|ask, text, ts}` records
//!
//! Both are normalized to `Message {role, content, timestamp}` with content
//! rendered to a display string before anything leaves the store.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
    System,
}

impl Role {
    /// Map an API-history role string. Unknown roles read as assistant
    /// output rather than being dropped.
    fn from_api(raw: &str) -> Self {
        match raw {
            "user" | "human" => Role::Human,
            "system" => Role::System,
            _ => Role::Assistant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Which of the two conversation files a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    ApiHistory,
    UiMessages,
}

/// One normalized conversation message. Immutable once read from disk
/// within a single query.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Epoch milliseconds, as written by the extension. Often absent in
    /// API history records.
    pub timestamp: Option<i64>,
}

impl Message {
    /// Normalize one raw record. Returns None for records that are not
    /// objects (malformed array elements are skipped, not fatal).
    pub fn from_record(kind: SourceKind, value: &Value) -> Option<Self> {
        match kind {
            SourceKind::ApiHistory => Self::from_api_record(value),
            SourceKind::UiMessages => Self::from_ui_record(value),
        }
    }

    fn from_api_record(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let role = obj
            .get("role")
            .and_then(|r| r.as_str())
            .map(Role::from_api)
            .unwrap_or(Role::Assistant);
        let content = obj.get("content").map(render_content).unwrap_or_default();
        let timestamp = obj
            .get("ts")
            .or_else(|| obj.get("timestamp"))
            .and_then(|t| t.as_i64());
        Some(Message {
            role,
            content,
            timestamp,
        })
    }

    fn from_ui_record(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        // "user_feedback" say-records are the human side; everything else
        // (plain says, asks, errors) is the extension talking.
        let role = if obj.get("say").and_then(|s| s.as_str()) == Some("user_feedback") {
            Role::Human
        } else {
            Role::Assistant
        };
        let content = obj.get("text").map(render_content).unwrap_or_default();
        let timestamp = obj.get("ts").and_then(|t| t.as_i64());
        Some(Message {
            role,
            content,
            timestamp,
        })
    }

    /// Sort key for recency ordering; missing timestamps sort first.
    pub fn sort_key(&self) -> i64 {
        self.timestamp.unwrap_or(0)
    }

    /// Case-insensitive substring match against the rendered content.
    /// The term must already be case-folded.
    pub fn matches(&self, folded_term: &str) -> bool {
        self.content.to_lowercase().contains(folded_term)
    }
}

/// Render arbitrary content JSON to a display string.
pub fn render_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(render_part)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn render_part(part: &Value) -> Option<String> {
    if let Some(s) = part.as_str() {
        return Some(s.to_string());
    }
    if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
        return Some(text.to_string());
    }
    match part.get("type").and_then(|t| t.as_str()) {
        Some("thinking") => part
            .get("thinking")
            .and_then(|t| t.as_str())
            .map(String::from),
        Some("tool_use") => Some(format!(
            "[tool: {}]",
            part.get("name").and_then(|n| n.as_str()).unwrap_or("unknown")
        )),
        Some("tool_result") => part.get("content").map(render_content),
        Some("image") => Some("[image]".to_string()),
        _ => None,
    }
}
