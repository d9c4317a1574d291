//! Conversation location resolution across install roots
//!
//! The producing extension ships under two install identities ("standard"
//! and "ultra"), each with its own global-storage directory per OS
//! convention. A conversation lives at ⟨root⟩/⟨conversationId⟩/ under
//! exactly one of the candidate roots; resolution walks the candidates in
//! a fixed order and the first root containing the directory wins.
//!
//! The search order is a contract, not an accident: configured override
//! paths come first within a variant, and ultra roots are searched before
//! standard roots.

mod standard;
mod ultra;

pub use standard::StandardRoots;
pub use ultra::UltraRoots;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::model::SourceKind;

pub const API_HISTORY_FILE: &str = "api_conversation_history.json";
pub const UI_MESSAGES_FILE: &str = "ui_messages.json";
pub const ACTIVE_TASKS_FILE: &str = "active_tasks.json";
pub const ADVICE_DIR: &str = "external-advice";

/// Extension install identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Standard,
    Ultra,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Ultra => "ultra",
        }
    }
}

/// Where a conversation's files live. Derived on lookup, never persisted.
#[derive(Debug, Clone)]
pub struct ConversationLocation {
    pub conversation_id: String,
    pub root: PathBuf,
    pub variant: Variant,
}

impl ConversationLocation {
    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.conversation_id)
    }

    pub fn source_path(&self, kind: SourceKind) -> PathBuf {
        match kind {
            SourceKind::ApiHistory => self.dir().join(API_HISTORY_FILE),
            SourceKind::UiMessages => self.dir().join(UI_MESSAGES_FILE),
        }
    }

    pub fn advice_dir(&self) -> PathBuf {
        self.dir().join(ADVICE_DIR)
    }
}

/// One source of candidate roots for a variant. Implementations return
/// candidates in priority order; they do not check existence.
pub trait RootProvider: Send + Sync {
    fn variant(&self) -> Variant;

    /// Human-readable description for diagnostics.
    fn description(&self) -> &str;

    /// Candidate roots in priority order (configured override first).
    fn candidate_roots(&self) -> Vec<PathBuf>;
}

/// Ordered registry of root providers.
pub struct RootRegistry {
    providers: Vec<Box<dyn RootProvider>>,
}

impl RootRegistry {
    pub fn new(config: &Config) -> Self {
        let mut registry = Self { providers: vec![] };

        // Ultra before standard: when both variants hold a conversation
        // directory for the same id, the ultra copy is authoritative.
        if config.is_variant_enabled(Variant::Ultra) {
            registry.register(Box::new(UltraRoots::new(config.root_override(Variant::Ultra))));
        }
        if config.is_variant_enabled(Variant::Standard) {
            registry.register(Box::new(StandardRoots::new(
                config.root_override(Variant::Standard),
            )));
        }

        registry
    }

    pub fn register(&mut self, provider: Box<dyn RootProvider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Box<dyn RootProvider>] {
        &self.providers
    }

    /// All candidate roots in search order.
    pub fn candidate_roots(&self) -> Vec<(Variant, PathBuf)> {
        self.providers
            .iter()
            .flat_map(|p| {
                let variant = p.variant();
                p.candidate_roots().into_iter().map(move |r| (variant, r))
            })
            .collect()
    }

    /// Candidate roots that exist on disk, in search order.
    pub fn existing_roots(&self) -> Vec<(Variant, PathBuf)> {
        self.candidate_roots()
            .into_iter()
            .filter(|(_, root)| root.is_dir())
            .collect()
    }

    /// Resolve a conversation id to its location: first candidate root
    /// containing ⟨root⟩/⟨id⟩/ wins.
    pub fn resolve(&self, conversation_id: &str) -> Result<ConversationLocation> {
        for (variant, root) in self.candidate_roots() {
            if root.join(conversation_id).is_dir() {
                return Ok(ConversationLocation {
                    conversation_id: conversation_id.to_string(),
                    root,
                    variant,
                });
            }
        }
        Err(StoreError::TaskNotFound(conversation_id.to_string()))
    }

    /// Enumerate conversations across all existing roots, most recently
    /// modified first. Ids claimed by an earlier root shadow later ones,
    /// matching the first-match resolution rule.
    pub fn list_conversations(&self) -> Vec<ConversationLocation> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut found: Vec<(SystemTime, ConversationLocation)> = vec![];

        for (variant, root) in self.existing_roots() {
            let entries = match std::fs::read_dir(&root) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let id = match path.file_name().and_then(|n| n.to_str()) {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                if !seen.insert(id.clone()) {
                    continue;
                }
                let modified = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                found.push((
                    modified,
                    ConversationLocation {
                        conversation_id: id,
                        root: root.clone(),
                        variant,
                    },
                ));
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0));
        found.into_iter().map(|(_, loc)| loc).collect()
    }
}
