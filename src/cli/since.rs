//! Since command implementation

use anyhow::{Context, Result};

use super::print_messages;
use crate::model::SourceKind;
use crate::store::ConversationStore;

pub async fn run(
    store: &ConversationStore,
    conversation_id: &str,
    since: &str,
    limit: usize,
    ui: bool,
) -> Result<()> {
    let since_ms = parse_since(since)?;
    let kind = if ui {
        SourceKind::UiMessages
    } else {
        SourceKind::ApiHistory
    };

    let messages = store
        .get_messages_since(conversation_id, since_ms, limit, kind)
        .await?;

    if messages.is_empty() {
        println!(
            "No messages in '{}' at or after {}.",
            conversation_id, since
        );
        return Ok(());
    }

    println!(
        "Showing {} message(s) from '{}' since {}:",
        messages.len(),
        conversation_id,
        since
    );
    print_messages(&messages);
    Ok(())
}

/// Accepts epoch milliseconds or an RFC3339 timestamp.
fn parse_since(raw: &str) -> Result<i64> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    let dt = chrono::DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("'{}' is neither epoch milliseconds nor RFC3339", raw))?;
    Ok(dt.timestamp_millis())
}
