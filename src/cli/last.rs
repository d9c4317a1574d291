//! Last command implementation

use anyhow::Result;

use super::print_messages;
use crate::model::SourceKind;
use crate::store::ConversationStore;

pub async fn run(
    store: &ConversationStore,
    conversation_id: &str,
    limit: usize,
    ui: bool,
) -> Result<()> {
    let kind = if ui {
        SourceKind::UiMessages
    } else {
        SourceKind::ApiHistory
    };

    let messages = store.get_last_messages(conversation_id, limit, kind).await?;

    if messages.is_empty() {
        println!("No messages found for '{}'.", conversation_id);
        return Ok(());
    }

    println!(
        "Showing {} message(s) from '{}':",
        messages.len(),
        conversation_id
    );
    print_messages(&messages);
    Ok(())
}
