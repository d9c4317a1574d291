//! CLI command implementations

pub mod active;
pub mod advise;
pub mod last;
pub mod list;
pub mod resolve;
pub mod search;
pub mod since;

use chrono::{TimeZone, Utc};

use crate::model::Message;

/// Format an epoch-ms timestamp for display.
pub(crate) fn format_timestamp(ts: Option<i64>) -> String {
    ts.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Print a message block
pub(crate) fn print_messages(messages: &[Message]) {
    for msg in messages {
        println!(
            "\n[{}] ({})",
            msg.role.as_str().to_uppercase(),
            format_timestamp(msg.timestamp)
        );
        println!("{}", msg.content);
        println!("{}", "-".repeat(40));
    }
}

/// First line of a message, truncated for one-line listings
pub(crate) fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or(text);
    if first_line.len() > 80 {
        format!("{}...", &first_line[..77])
    } else {
        first_line.to_string()
    }
}
