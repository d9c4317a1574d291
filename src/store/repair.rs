//! JSON repair engine
//!
//! Conversation files are occasionally cut short or mangled by the
//! producing extension (a write interrupted mid-save, a missing comma
//! between serialized entries). Strict parsing is always tried first; on
//! failure a small set of line-based fixes is applied for omissions at
//! well-known structural boundaries, then parsing is tried once more.
//! Anything still invalid yields None and the caller degrades to an empty
//! result.
//!
//! The comma heuristics assume one property per line; differently
//! formatted malformed JSON may not repair. Known limitation — the fix
//! set is deliberately narrow rather than guessing broader intent.

use serde_json::Value;

/// Top-level keys a truncated wrapper object may start with.
const KNOWN_TOP_LEVEL_KEYS: [&str; 3] = ["\"messages\"", "\"conversation\"", "\"activeTasks\""];

/// Strict parse, then repair-and-reparse. Never panics, never errors.
pub fn parse_with_repair(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    serde_json::from_str(&repair(text)).ok()
}

fn repair(text: &str) -> String {
    let mut repaired = text.trim().to_string();

    // Missing opening brace before a known top-level key
    if !repaired.starts_with('{') && KNOWN_TOP_LEVEL_KEYS.iter().any(|k| repaired.starts_with(k)) {
        repaired.insert(0, '{');
    }

    // Missing closing brace after the wrapped array. Only wrapper objects
    // qualify; a bare top-level array legitimately ends with ']'.
    if repaired.starts_with('{') && !repaired.ends_with('}') && repaired.ends_with(']') {
        repaired.push('}');
    }

    insert_missing_commas(&repaired)
}

/// Insert commas between adjacent key-value lines and between an
/// object-closing and object-opening brace on separate lines.
fn insert_missing_commas(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let mut fixed = line.to_string();
        if let Some(next) = lines.get(i + 1) {
            if needs_comma(line.trim_end(), next.trim_start()) {
                fixed.push(',');
            }
        }
        out.push(fixed);
    }

    out.join("\n")
}

fn needs_comma(end: &str, start: &str) -> bool {
    // Adjacent object literals (array elements) on separate lines
    if end.ends_with('}') && start.starts_with('{') {
        return true;
    }
    // A scalar/string value line followed by another key line
    let value_end = end.ends_with('"')
        || end.ends_with(|c: char| c.is_ascii_digit())
        || end.ends_with("true")
        || end.ends_with("false")
        || end.ends_with("null");
    value_end && start.starts_with('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_parse_untouched() {
        let text = r#"[{"role":"user","content":"hi","ts":1}]"#;
        let value = parse_with_repair(text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_comma_between_object_literals() {
        let text = "[\n{\"say\": \"text\", \"text\": \"a\", \"ts\": 1}\n{\"say\": \"text\", \"text\": \"b\", \"ts\": 2}\n]";
        let value = parse_with_repair(text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_comma_between_key_value_lines() {
        let text = "{\n\"a\": 1\n\"b\": \"two\"\n\"c\": true\n}";
        let value = parse_with_repair(text).unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(value["b"], "two");
        assert_eq!(value["c"], true);
    }

    #[test]
    fn test_missing_opening_brace_before_known_key() {
        let text = "\"messages\": [{\"role\": \"user\", \"content\": \"hi\"}]}";
        let value = parse_with_repair(text).unwrap();
        assert!(value["messages"].is_array());
    }

    #[test]
    fn test_missing_closing_brace_after_array() {
        let text = "{\"messages\": [{\"role\": \"user\", \"content\": \"hi\"}]";
        let value = parse_with_repair(text).unwrap();
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_unrepairable_garbage_is_none() {
        assert!(parse_with_repair("not json at all {{{").is_none());
        assert!(parse_with_repair("").is_none());
    }

    #[test]
    fn test_valid_lines_do_not_gain_commas() {
        // Already well-formed multi-line JSON must survive the heuristics
        let text = "{\n\"a\": 1,\n\"b\": {\n\"c\": \"x\"\n}\n}";
        let value = parse_with_repair(text).unwrap();
        assert_eq!(value["b"]["c"], "x");
    }
}
