//! Active conversation markers
//!
//! The extension writes `active_tasks.json` at each install root:
//!   {"activeTasks": [{"id": "...", "label": "A", "lastActivated": 1710000000000}]}
//!
//! At most one marker per label is meaningful at a time, but the backing
//! store may technically hold more. The selection rule is product policy,
//! isolated in `select_active` so it can be revisited without touching
//! storage or caching.

use serde::{Deserialize, Serialize};

use super::repair::parse_with_repair;

/// Sentinel conversation ids meaning "the active conversation under
/// label A/B". Resolved before any location lookup.
pub const ACTIVE_A: &str = "ACTIVE_A";
pub const ACTIVE_B: &str = "ACTIVE_B";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
        }
    }
}

/// Map a sentinel id to its label, if it is one.
pub fn sentinel_label(conversation_id: &str) -> Option<Label> {
    match conversation_id {
        ACTIVE_A => Some(Label::A),
        ACTIVE_B => Some(Label::B),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveMarker {
    pub id: String,
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(rename = "lastActivated", default)]
    pub last_activated: Option<i64>,
}

/// Parse one active_tasks.json payload. Repair-tolerant; unparseable
/// markers are skipped individually rather than discarding the file.
pub fn parse_active_tasks(text: &str) -> Vec<ActiveMarker> {
    let value = match parse_with_repair(text) {
        Some(v) => v,
        None => return vec![],
    };
    value
        .get("activeTasks")
        .and_then(|v| v.as_array())
        .map(|markers| {
            markers
                .iter()
                .filter_map(|m| serde_json::from_value(m.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Product policy: a requested label wins; otherwise label A is preferred
/// over B; unlabeled markers only count when no labeled one exists. Ties
/// within a label go to the most recently activated marker.
pub fn select_active(markers: &[ActiveMarker], requested: Option<Label>) -> Option<&ActiveMarker> {
    match requested {
        Some(label) => most_recent(markers.iter().filter(|m| m.label == Some(label))),
        None => most_recent(markers.iter().filter(|m| m.label == Some(Label::A)))
            .or_else(|| most_recent(markers.iter().filter(|m| m.label == Some(Label::B))))
            .or_else(|| most_recent(markers.iter())),
    }
}

fn most_recent<'a>(markers: impl Iterator<Item = &'a ActiveMarker>) -> Option<&'a ActiveMarker> {
    markers.max_by_key(|m| m.last_activated.unwrap_or(0))
}
