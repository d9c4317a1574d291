//! Search command implementation

use anyhow::Result;

use super::{format_timestamp, preview};
use crate::model::SourceKind;
use crate::store::{ContextHit, ConversationStore, MAX_LIMIT};

pub async fn run(
    store: &ConversationStore,
    term: &str,
    conversation: Option<String>,
    context: Option<usize>,
    max_results: usize,
    ui: bool,
) -> Result<()> {
    let kind = if ui {
        SourceKind::UiMessages
    } else {
        SourceKind::ApiHistory
    };

    match conversation {
        // Flat match listing within one conversation
        Some(id) if context.is_none() => {
            let messages = store.search_messages(&id, term, MAX_LIMIT, kind).await?;
            if messages.is_empty() {
                println!("No matches for '{}' in '{}'.", term, id);
                return Ok(());
            }
            println!("{} match(es) for '{}' in '{}':", messages.len(), term, id);
            for msg in &messages {
                println!(
                    "  [{}] ({}) {}",
                    msg.role.as_str(),
                    format_timestamp(msg.timestamp),
                    preview(&msg.content)
                );
            }
        }
        // Window around the first match in one conversation
        Some(id) => {
            let window = context.unwrap_or(2);
            match store.context_window(&id, term, window, kind).await? {
                Some(hit) => print_hit(&hit),
                None => println!("No matches for '{}' in '{}'.", term, id),
            }
        }
        // Broad scan across conversations, most recently active first
        None => {
            let window = context.unwrap_or(2);
            let hits = store
                .search_with_context(term, window, max_results, kind)
                .await?;
            if hits.is_empty() {
                println!("No matches for '{}' in any conversation.", term);
                return Ok(());
            }
            for hit in &hits {
                print_hit(hit);
            }
        }
    }

    Ok(())
}

fn print_hit(hit: &ContextHit) {
    println!(
        "\n=== {} (messages {}..{} of {}) ===",
        hit.conversation_id, hit.start, hit.end, hit.total
    );
    for (offset, msg) in hit.window.iter().enumerate() {
        let index = hit.start + offset;
        let marker = if index == hit.match_index { ">" } else { " " };
        println!(
            "{} [{}] ({}) {}",
            marker,
            msg.role.as_str(),
            format_timestamp(msg.timestamp),
            preview(&msg.content)
        );
    }
}
