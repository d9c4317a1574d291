//! Active command implementation

use anyhow::{bail, Result};

use super::format_timestamp;
use crate::store::{ConversationStore, Label};

pub async fn run(store: &ConversationStore, label: Option<String>) -> Result<()> {
    let requested = match label.as_deref() {
        Some(raw) => Some(parse_label(raw)?),
        None => None,
    };

    match store.resolve_active(requested).await? {
        Some(marker) => {
            println!(
                "Active conversation: {} (label {}, last activated {})",
                marker.id,
                marker.label.map(|l| l.as_str()).unwrap_or("-"),
                format_timestamp(marker.last_activated)
            );
        }
        None => {
            println!("No active conversation.");
            return Ok(());
        }
    }

    // Without a label filter, show the whole marker snapshot too
    if requested.is_none() {
        let markers = store.active_markers().await?;
        if markers.len() > 1 {
            println!("\nAll markers:");
            for marker in &markers {
                println!(
                    "  {} (label {}, last activated {})",
                    marker.id,
                    marker.label.map(|l| l.as_str()).unwrap_or("-"),
                    format_timestamp(marker.last_activated)
                );
            }
        }
    }

    Ok(())
}

fn parse_label(raw: &str) -> Result<Label> {
    match raw {
        "A" | "a" => Ok(Label::A),
        "B" | "b" => Ok(Label::B),
        _ => bail!("label must be A or B, got '{}'", raw),
    }
}
