//! Conversation store access layer
//!
//! Read-through facade over the location registry, resilient reader,
//! repair engine, and bounded extractor. Owns the TTL caches for resolved
//! locations, active-marker snapshots, and per-file query results. Public
//! operations clamp their inputs and favor partial results over hard
//! failure: a missing file is ordinary emptiness, an unparseable file
//! degrades to empty after repair, and a blown read deadline logs and
//! returns empty instead of blocking the caller.

mod active;
mod advice;
mod cache;
mod context;
mod extract;
mod reader;
mod repair;

pub use active::{
    parse_active_tasks, select_active, sentinel_label, ActiveMarker, Label, ACTIVE_A, ACTIVE_B,
};
pub use advice::AdviceDraft;
pub use cache::TtlCache;
pub use context::{window_around_match, ContextHit, MAX_CONTEXT_LINES};
pub use extract::{ExtractOptions, DEFAULT_LIMIT, MAX_LIMIT};
pub use reader::{read_with_retry, with_deadline, RetryPolicy};
pub use repair::parse_with_repair;

use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::locate::{ConversationLocation, RootRegistry, ACTIVE_TASKS_FILE};
use crate::model::{Message, SourceKind};

/// Cache key for per-file query results: file path + query shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    path: PathBuf,
    opts: ExtractOptions,
}

pub struct ConversationStore {
    registry: RootRegistry,
    retry: RetryPolicy,
    read_timeout: Duration,
    locations: TtlCache<String, ConversationLocation>,
    queries: TtlCache<QueryKey, Vec<Message>>,
    markers: TtlCache<(), Vec<ActiveMarker>>,
}

impl ConversationStore {
    pub fn new(config: &Config) -> Self {
        Self::with_registry(config, RootRegistry::new(config))
    }

    /// Build over an explicit registry; tests inject fixture roots here.
    pub fn with_registry(config: &Config, registry: RootRegistry) -> Self {
        let ttl = Duration::from_millis(config.cache.ttl_ms);
        Self {
            registry,
            retry: RetryPolicy::from_config(&config.reader),
            read_timeout: Duration::from_millis(config.reader.timeout_ms),
            locations: TtlCache::new(ttl),
            queries: TtlCache::new(ttl),
            markers: TtlCache::new(ttl),
        }
    }

    pub fn registry(&self) -> &RootRegistry {
        &self.registry
    }

    // ============================================
    // RESOLUTION
    // ============================================

    /// Resolve a conversation id (or ACTIVE_A/ACTIVE_B sentinel) to its
    /// on-disk location. Cached by concrete id.
    pub async fn resolve(&self, conversation_id: &str) -> Result<ConversationLocation> {
        let concrete = self.resolve_sentinel(conversation_id).await?;
        let key = concrete.clone();
        self.locations
            .get_or_try_compute(key, || {
                let registry = &self.registry;
                async move { registry.resolve(&concrete) }
            })
            .await
    }

    /// Map the ACTIVE_A/ACTIVE_B sentinels to the concrete active
    /// conversation id; other ids pass through unchanged.
    async fn resolve_sentinel(&self, conversation_id: &str) -> Result<String> {
        match sentinel_label(conversation_id) {
            Some(label) => {
                let markers = self.active_markers().await?;
                select_active(&markers, Some(label))
                    .map(|m| m.id.clone())
                    .ok_or_else(|| StoreError::TaskNotFound(conversation_id.to_string()))
            }
            None => Ok(conversation_id.to_string()),
        }
    }

    /// Merged active-marker snapshot: every existing root's
    /// active_tasks.json, concatenated in registry order. Cached.
    pub async fn active_markers(&self) -> Result<Vec<ActiveMarker>> {
        self.markers
            .get_or_try_compute((), || async move {
                let mut all = vec![];
                for (_, root) in self.registry.existing_roots() {
                    let path = root.join(ACTIVE_TASKS_FILE);
                    if !path.is_file() {
                        continue;
                    }
                    let text = reader::read_with_retry(&path, self.retry).await?;
                    all.extend(parse_active_tasks(&text));
                }
                Ok(all)
            })
            .await
    }

    /// The active conversation marker under an optional label.
    pub async fn resolve_active(&self, label: Option<Label>) -> Result<Option<ActiveMarker>> {
        let markers = self.active_markers().await?;
        Ok(select_active(&markers, label).cloned())
    }

    // ============================================
    // QUERIES
    // ============================================

    /// The most recent `limit` messages, ascending by timestamp.
    pub async fn get_last_messages(
        &self,
        conversation_id: &str,
        limit: usize,
        kind: SourceKind,
    ) -> Result<Vec<Message>> {
        self.query(
            conversation_id,
            kind,
            ExtractOptions {
                limit,
                since: None,
                search: None,
            },
        )
        .await
    }

    /// Messages with timestamp >= `since` (untimestamped messages are
    /// kept), ascending, bounded by `limit`.
    pub async fn get_messages_since(
        &self,
        conversation_id: &str,
        since: i64,
        limit: usize,
        kind: SourceKind,
    ) -> Result<Vec<Message>> {
        self.query(
            conversation_id,
            kind,
            ExtractOptions {
                limit,
                since: Some(since),
                search: None,
            },
        )
        .await
    }

    /// Messages whose rendered content contains `term`
    /// (case-insensitive), ascending, bounded by `limit`.
    pub async fn search_messages(
        &self,
        conversation_id: &str,
        term: &str,
        limit: usize,
        kind: SourceKind,
    ) -> Result<Vec<Message>> {
        self.query(
            conversation_id,
            kind,
            ExtractOptions {
                limit,
                since: None,
                search: Some(term.to_string()),
            },
        )
        .await
    }

    /// Read-through cached query with the deadline race. A timeout is
    /// logged and served as empty (and not cached); a missing file is
    /// ordinary emptiness.
    async fn query(
        &self,
        conversation_id: &str,
        kind: SourceKind,
        opts: ExtractOptions,
    ) -> Result<Vec<Message>> {
        let location = self.resolve(conversation_id).await?;
        let path = location.source_path(kind);
        if !path.is_file() {
            return Ok(vec![]);
        }

        let key = QueryKey {
            path: path.clone(),
            opts: opts.clone(),
        };
        let result = self
            .queries
            .get_or_try_compute(key, || {
                let path = path.clone();
                let retry = self.retry;
                let deadline = self.read_timeout;
                async move {
                    reader::with_deadline(
                        &path,
                        deadline,
                        extract::extract(&path, kind, &opts, retry),
                    )
                    .await
                }
            })
            .await;

        match result {
            Err(StoreError::Timeout { path, timeout_ms }) => {
                eprintln!(
                    "Warning: timed out after {}ms reading {}; returning no messages",
                    timeout_ms,
                    path.display()
                );
                Ok(vec![])
            }
            other => other,
        }
    }

    // ============================================
    // CONTEXT SEARCH
    // ============================================

    /// Window around the first match in one conversation, or None when
    /// the term appears nowhere in it.
    pub async fn context_window(
        &self,
        conversation_id: &str,
        term: &str,
        context_lines: usize,
        kind: SourceKind,
    ) -> Result<Option<ContextHit>> {
        let location = self.resolve(conversation_id).await?;
        let messages = self.full_sequence(&location, kind).await?;
        Ok(window_around_match(
            &location.conversation_id,
            &messages,
            term,
            context_lines,
        ))
    }

    /// Broad search: scan conversations most-recently-active first,
    /// collecting one window per conversation until `max_results`.
    /// Per-conversation failures are skipped, not fatal.
    pub async fn search_with_context(
        &self,
        term: &str,
        context_lines: usize,
        max_results: usize,
        kind: SourceKind,
    ) -> Result<Vec<ContextHit>> {
        let mut hits = vec![];
        for location in self.registry.list_conversations() {
            if hits.len() >= max_results {
                break;
            }
            let messages = match self.full_sequence(&location, kind).await {
                Ok(messages) => messages,
                Err(e) => {
                    eprintln!(
                        "Warning: skipping conversation {}: {}",
                        location.conversation_id, e
                    );
                    continue;
                }
            };
            if let Some(hit) = window_around_match(
                &location.conversation_id,
                &messages,
                term,
                context_lines,
            ) {
                hits.push(hit);
            }
        }
        Ok(hits)
    }

    /// Full sequence load under the read deadline; timeout degrades to
    /// an empty sequence.
    async fn full_sequence(
        &self,
        location: &ConversationLocation,
        kind: SourceKind,
    ) -> Result<Vec<Message>> {
        let path = location.source_path(kind);
        if !path.is_file() {
            return Ok(vec![]);
        }
        match reader::with_deadline(
            &path,
            self.read_timeout,
            extract::load_all(&path, kind, self.retry),
        )
        .await
        {
            Err(StoreError::Timeout { path, timeout_ms }) => {
                eprintln!(
                    "Warning: timed out after {}ms reading {}; returning no messages",
                    timeout_ms,
                    path.display()
                );
                Ok(vec![])
            }
            other => other,
        }
    }

    // ============================================
    // ADVICE
    // ============================================

    /// Write one append-only advice notification into a conversation's
    /// external-advice directory.
    pub async fn write_advice(
        &self,
        conversation_id: &str,
        draft: &AdviceDraft,
    ) -> anyhow::Result<PathBuf> {
        let location = self.resolve(conversation_id).await?;
        advice::write_advice(&location, draft)
    }
}
