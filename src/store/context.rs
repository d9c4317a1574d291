//! Context-window slicing
//!
//! A search match is only useful with its surroundings. Given a full
//! message sequence, locate the first case-insensitive match and cut a
//! contiguous slice spanning `context_lines` messages either side,
//! clamped to the sequence bounds.

use serde::Serialize;

use crate::model::Message;

pub const MAX_CONTEXT_LINES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ContextHit {
    pub conversation_id: String,
    /// Absolute index of the matching message.
    pub match_index: usize,
    /// Absolute index range of the window; `end` is exclusive.
    pub start: usize,
    pub end: usize,
    /// Total sequence length.
    pub total: usize,
    pub window: Vec<Message>,
}

/// First match and its window, or None when the term appears nowhere.
pub fn window_around_match(
    conversation_id: &str,
    messages: &[Message],
    term: &str,
    context_lines: usize,
) -> Option<ContextHit> {
    let folded = term.to_lowercase();
    let context = context_lines.min(MAX_CONTEXT_LINES);

    let match_index = messages.iter().position(|m| m.matches(&folded))?;
    let start = match_index.saturating_sub(context);
    let end = (match_index + context + 1).min(messages.len());

    Some(ContextHit {
        conversation_id: conversation_id.to_string(),
        match_index,
        start,
        end,
        total: messages.len(),
        window: messages[start..end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn sequence(contents: &[&str]) -> Vec<Message> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| Message {
                role: Role::Human,
                content: c.to_string(),
                timestamp: Some(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_window_in_the_middle() {
        let messages = sequence(&["a", "b", "needle here", "d", "e"]);
        let hit = window_around_match("100", &messages, "NEEDLE", 1).unwrap();
        assert_eq!(hit.match_index, 2);
        assert_eq!((hit.start, hit.end), (1, 4));
        assert_eq!(hit.total, 5);
        let window: Vec<&str> = hit.window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(window, vec!["b", "needle here", "d"]);
    }

    #[test]
    fn test_window_clamped_at_start() {
        let messages = sequence(&["needle", "b", "c"]);
        let hit = window_around_match("100", &messages, "needle", 2).unwrap();
        assert_eq!((hit.start, hit.end), (0, 3));
    }

    #[test]
    fn test_window_clamped_at_end() {
        let messages = sequence(&["a", "b", "needle"]);
        let hit = window_around_match("100", &messages, "needle", 2).unwrap();
        assert_eq!((hit.start, hit.end), (0, 3));
        assert_eq!(hit.match_index, 2);
    }

    #[test]
    fn test_no_match() {
        let messages = sequence(&["a", "b"]);
        assert!(window_around_match("100", &messages, "zzz", 2).is_none());
    }

    #[test]
    fn test_context_lines_clamped() {
        let messages = sequence(&["needle"]);
        let hit = window_around_match("100", &messages, "needle", 500).unwrap();
        assert_eq!((hit.start, hit.end), (0, 1));
    }
}
