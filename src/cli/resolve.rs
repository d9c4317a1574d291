//! Resolve command implementation

use anyhow::Result;

use crate::error::StoreError;
use crate::model::SourceKind;
use crate::store::ConversationStore;

pub async fn run(store: &ConversationStore, conversation_id: &str) -> Result<()> {
    let location = match store.resolve(conversation_id).await {
        Ok(location) => location,
        Err(StoreError::TaskNotFound(_)) => {
            println!(
                "Conversation '{}' not found under any install root.",
                conversation_id
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Conversation: {}", location.conversation_id);
    println!("Variant:      {}", location.variant.as_str());
    println!("Root:         {}", location.root.display());

    for kind in [SourceKind::ApiHistory, SourceKind::UiMessages] {
        let path = location.source_path(kind);
        match std::fs::metadata(&path) {
            Ok(meta) => println!("  {} ({} bytes)", path.display(), meta.len()),
            Err(_) => println!("  {} (missing)", path.display()),
        }
    }

    Ok(())
}
