//! Bounded array extraction
//!
//! Serves "most recent N matching messages" over a conversation file
//! without materializing more than necessary. Two strategies:
//!
//! - **streaming**: walks the top-level JSON array with a serde sequence
//!   visitor, normalizing and filtering each element as it is parsed and
//!   retaining at most `limit` candidates in a min-heap keyed by
//!   (timestamp, encounter index)
//! - **direct**: reads the whole file (with retry), strict-parses with
//!   repair fallback, unwraps known wrapper objects, then filters and
//!   sorts
//!
//! Streaming is tried first; any streaming failure (wrapper object,
//! malformed JSON, I/O error) falls back to direct. Both return the last
//! `limit` matching items in ascending timestamp order, with missing
//! timestamps sorting as 0.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::path::Path;

use serde::de::{DeserializeSeed, SeqAccess, Visitor};
use serde_json::Value;

use super::reader::{read_with_retry, RetryPolicy};
use super::repair::parse_with_repair;
use crate::error::Result;
use crate::model::{Message, SourceKind};

/// Server-side clamp on requested limits.
pub const MAX_LIMIT: usize = 100;
pub const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractOptions {
    pub limit: usize,
    /// Epoch ms; items with a timestamp below this are dropped. Items
    /// without a timestamp are kept.
    pub since: Option<i64>,
    /// Case-insensitive substring over rendered content.
    pub search: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            since: None,
            search: None,
        }
    }
}

impl ExtractOptions {
    fn clamped_limit(&self) -> usize {
        self.limit.min(MAX_LIMIT)
    }
}

/// Filter predicate shared by both strategies.
#[derive(Clone)]
struct RecordFilter {
    since: Option<i64>,
    folded_term: Option<String>,
}

impl RecordFilter {
    fn new(opts: &ExtractOptions) -> Self {
        Self {
            since: opts.since,
            folded_term: opts.search.as_ref().map(|s| s.to_lowercase()),
        }
    }

    fn admits(&self, msg: &Message) -> bool {
        if let (Some(since), Some(ts)) = (self.since, msg.timestamp) {
            if ts < since {
                return false;
            }
        }
        if let Some(term) = &self.folded_term {
            if !msg.matches(term) {
                return false;
            }
        }
        true
    }
}

/// Candidate ordered by (timestamp, encounter index); the index keeps
/// equal-timestamp messages in file order.
struct Ranked {
    key: (i64, usize),
    msg: Message,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Extract the most recent `limit` matching messages from a conversation
/// file, in ascending timestamp order.
pub async fn extract(
    path: &Path,
    kind: SourceKind,
    opts: &ExtractOptions,
    retry: RetryPolicy,
) -> Result<Vec<Message>> {
    let limit = opts.clamped_limit();
    if limit == 0 {
        return Ok(vec![]);
    }
    let filter = RecordFilter::new(opts);

    // Streaming first: bounded memory, no whole-file materialization.
    let streamed = {
        let path = path.to_path_buf();
        let filter = filter.clone();
        tokio::task::spawn_blocking(move || stream_extract(&path, kind, limit, &filter)).await
    };
    if let Ok(Ok(messages)) = streamed {
        return Ok(messages);
    }

    direct_extract(path, kind, limit, &filter, retry).await
}

/// Streaming strategy: incremental sequence visit over a buffered reader.
fn stream_extract(
    path: &Path,
    kind: SourceKind,
    limit: usize,
    filter: &RecordFilter,
) -> anyhow::Result<Vec<Message>> {
    let file = std::fs::File::open(path)?;
    let mut de = serde_json::Deserializer::from_reader(std::io::BufReader::new(file));
    let collector = BoundedCollector {
        kind,
        limit,
        filter,
    };
    let messages = collector.deserialize(&mut de)?;
    de.end()?;
    Ok(messages)
}

struct BoundedCollector<'a> {
    kind: SourceKind,
    limit: usize,
    filter: &'a RecordFilter,
}

impl<'de> DeserializeSeed<'de> for BoundedCollector<'_> {
    type Value = Vec<Message>;

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for BoundedCollector<'_> {
    type Value = Vec<Message>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a top-level conversation array")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::new();
        let mut index = 0usize;

        while let Some(value) = seq.next_element::<Value>()? {
            if let Some(msg) = Message::from_record(self.kind, &value) {
                if self.filter.admits(&msg) {
                    heap.push(Reverse(Ranked {
                        key: (msg.sort_key(), index),
                        msg,
                    }));
                    // Evict the oldest candidate once over the bound
                    if heap.len() > self.limit {
                        heap.pop();
                    }
                }
            }
            index += 1;
        }

        let mut ranked: Vec<Ranked> = heap.into_iter().map(|Reverse(r)| r).collect();
        ranked.sort();
        Ok(ranked.into_iter().map(|r| r.msg).collect())
    }
}

/// Direct strategy: whole-file parse with repair, then filter and slice.
async fn direct_extract(
    path: &Path,
    kind: SourceKind,
    limit: usize,
    filter: &RecordFilter,
    retry: RetryPolicy,
) -> Result<Vec<Message>> {
    let text = read_with_retry(path, retry).await?;

    let value = match parse_with_repair(&text) {
        Some(v) => v,
        None => {
            eprintln!(
                "Warning: {} is not valid JSON even after repair; treating as empty",
                path.display()
            );
            return Ok(vec![]);
        }
    };

    let records = match unwrap_records(&value) {
        Some(records) => records,
        None => {
            eprintln!(
                "Warning: {} does not contain a conversation array; treating as empty",
                path.display()
            );
            return Ok(vec![]);
        }
    };

    let mut ranked: Vec<Ranked> = records
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            Message::from_record(kind, value).map(|msg| (index, msg))
        })
        .filter(|(_, msg)| filter.admits(msg))
        .map(|(index, msg)| Ranked {
            key: (msg.sort_key(), index),
            msg,
        })
        .collect();
    ranked.sort();

    let skip = ranked.len().saturating_sub(limit);
    Ok(ranked.into_iter().skip(skip).map(|r| r.msg).collect())
}

/// Load and normalize an entire sequence, unbounded. Context windows
/// need random access around a match, so this path never streams.
pub(super) async fn load_all(
    path: &Path,
    kind: SourceKind,
    retry: RetryPolicy,
) -> Result<Vec<Message>> {
    let filter = RecordFilter {
        since: None,
        folded_term: None,
    };
    direct_extract(path, kind, usize::MAX, &filter, retry).await
}

/// A conversation file is either a bare array or an object wrapping one
/// under a known key.
fn unwrap_records(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(records) => Some(records),
        Value::Object(obj) => obj
            .get("messages")
            .or_else(|| obj.get("conversation"))
            .and_then(|v| v.as_array()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn api_array(count: usize) -> String {
        let records: Vec<String> = (1..=count)
            .map(|i| format!(r#"{{"role":"user","content":"message {}","ts":{}}}"#, i, i))
            .collect();
        format!("[{}]", records.join(","))
    }

    fn opts(limit: usize) -> ExtractOptions {
        ExtractOptions {
            limit,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_last_n_keeps_greatest_timestamps_ascending() {
        let file = write_file(&api_array(45));
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &opts(20),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(messages.len(), 20);
        assert_eq!(messages[0].timestamp, Some(26));
        assert_eq!(messages[19].timestamp, Some(45));
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_limit_larger_than_file_returns_all() {
        let file = write_file(&api_array(5));
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &opts(50),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(messages.len(), 5);
    }

    #[tokio::test]
    async fn test_since_drops_older_but_keeps_untimestamped() {
        let file = write_file(
            r#"[
                {"role":"user","content":"old","ts":10},
                {"role":"assistant","content":"undated"},
                {"role":"user","content":"new","ts":30}
            ]"#,
        );
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &ExtractOptions {
                limit: 10,
                since: Some(20),
                search: None,
            },
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["undated", "new"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let file = write_file(
            r#"[
                {"role":"user","content":"Deploy the SERVICE","ts":1},
                {"role":"assistant","content":"done","ts":2}
            ]"#,
        );
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &ExtractOptions {
                limit: 10,
                since: None,
                search: Some("service".to_string()),
            },
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Deploy the SERVICE");
    }

    #[tokio::test]
    async fn test_absent_search_term_yields_empty() {
        let file = write_file(&api_array(5));
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &ExtractOptions {
                limit: 10,
                since: None,
                search: Some("nowhere".to_string()),
            },
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_wrapper_object_falls_back_to_direct() {
        let file = write_file(
            r#"{"messages": [
                {"role":"user","content":"a","ts":1},
                {"role":"assistant","content":"b","ts":2}
            ]}"#,
        );
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &opts(10),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "b");
    }

    #[tokio::test]
    async fn test_missing_comma_is_repaired_via_fallback() {
        let file = write_file(
            "[\n{\"say\":\"text\",\"text\":\"first\",\"ts\":1}\n{\"say\":\"text\",\"text\":\"second\",\"ts\":2}\n]",
        );
        let messages = extract(
            file.path(),
            SourceKind::UiMessages,
            &opts(10),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
    }

    #[tokio::test]
    async fn test_unrepairable_file_degrades_to_empty() {
        let file = write_file("definitely not json {{{");
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &opts(10),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_requested_limit_is_clamped() {
        let file = write_file(&api_array(150));
        let messages = extract(
            file.path(),
            SourceKind::ApiHistory,
            &opts(500),
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        assert_eq!(messages.len(), MAX_LIMIT);
        assert_eq!(messages.last().unwrap().timestamp, Some(150));
    }

    #[test]
    fn test_streaming_matches_direct_semantics() {
        let file = write_file(&api_array(30));
        let filter = RecordFilter::new(&opts(10));
        let streamed =
            stream_extract(file.path(), SourceKind::ApiHistory, 10, &filter).unwrap();

        assert_eq!(streamed.len(), 10);
        assert_eq!(streamed[0].timestamp, Some(21));
        assert_eq!(streamed[9].timestamp, Some(30));
    }
}
