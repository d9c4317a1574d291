//! Advice notification writer
//!
//! Notifications are append-only side files under
//! ⟨task⟩/external-advice/⟨adviceId⟩.json: one new uuid-named file per
//! advice, never rewritten. This path shares root resolution with the
//! read side and nothing else; the query caches do not cover it.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

use crate::locate::ConversationLocation;

#[derive(Debug, Clone)]
pub struct AdviceDraft {
    pub title: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct AdviceRecord<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    content: &'a str,
    created_at: i64,
    read: bool,
}

/// Write one advice notification, returning the path of the new file.
pub fn write_advice(location: &ConversationLocation, draft: &AdviceDraft) -> Result<PathBuf> {
    let dir = location.advice_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create advice directory {}", dir.display()))?;

    let id = uuid::Uuid::new_v4().to_string();
    let record = AdviceRecord {
        id: &id,
        title: draft.title.as_deref(),
        content: &draft.content,
        created_at: Utc::now().timestamp_millis(),
        read: false,
    };

    let path = dir.join(format!("{}.json", id));
    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write advice file {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::Variant;

    #[test]
    fn test_write_advice_creates_one_file_per_call() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("100")).unwrap();
        let location = ConversationLocation {
            conversation_id: "100".to_string(),
            root: root.path().to_path_buf(),
            variant: Variant::Standard,
        };

        let draft = AdviceDraft {
            title: Some("heads up".to_string()),
            content: "the build is red".to_string(),
        };
        let first = write_advice(&location, &draft).unwrap();
        let second = write_advice(&location, &draft).unwrap();
        assert_ne!(first, second);

        let text = std::fs::read_to_string(&first).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["title"], "heads up");
        assert_eq!(value["content"], "the build is red");
        assert_eq!(value["read"], false);
        assert!(value["created_at"].as_i64().unwrap() > 0);

        assert_eq!(
            std::fs::read_dir(location.advice_dir()).unwrap().count(),
            2
        );
    }

    #[test]
    fn test_title_is_omitted_when_absent() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("100")).unwrap();
        let location = ConversationLocation {
            conversation_id: "100".to_string(),
            root: root.path().to_path_buf(),
            variant: Variant::Standard,
        };

        let path = write_advice(
            &location,
            &AdviceDraft {
                title: None,
                content: "x".to_string(),
            },
        )
        .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert!(value.get("title").is_none());
    }
}
