//! List command implementation

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::store::ConversationStore;

pub fn run(store: &ConversationStore) -> Result<()> {
    let conversations = store.registry().list_conversations();

    if conversations.is_empty() {
        println!("No conversations found under any install root.");
        return Ok(());
    }

    println!("{:<18} {:<10} {:<20} Root", "Id", "Variant", "Modified");
    println!("{}", "-".repeat(90));

    for location in conversations {
        let modified = std::fs::metadata(location.dir())
            .and_then(|m| m.modified())
            .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| "-".to_string());

        println!(
            "{:<18} {:<10} {:<20} {}",
            location.conversation_id,
            location.variant.as_str(),
            modified,
            location.root.display()
        );
    }

    Ok(())
}
