//! Advise command implementation

use anyhow::Result;

use crate::store::{AdviceDraft, ConversationStore};

pub async fn run(
    store: &ConversationStore,
    conversation_id: &str,
    content: String,
    title: Option<String>,
) -> Result<()> {
    let draft = AdviceDraft { title, content };
    let path = store.write_advice(conversation_id, &draft).await?;
    println!("Advice written to {}", path.display());
    Ok(())
}
