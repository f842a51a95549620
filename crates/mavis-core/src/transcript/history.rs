use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use super::{Message, Role};

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Option<HistoryData>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    content: Option<String>,
}

/// Parses a conversation history payload.
///
/// The payload is a JSON array of `{"type": ..., "data": {"content": ...}}`
/// entries. System entries are dropped; malformed entries are skipped with
/// a warning so one bad record does not hide the rest of the conversation.
pub fn parse_history(json: &str) -> Result<Vec<Message>> {
    let value: Value = serde_json::from_str(json).context("Failed to parse history JSON")?;
    let Value::Array(entries) = value else {
        bail!("Invalid history format: expected an array");
    };

    let mut messages = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let parsed = match serde_json::from_value::<HistoryEntry>(entry) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping invalid history entry");
                continue;
            }
        };

        let (Some(kind), Some(content)) = (parsed.kind, parsed.data.and_then(|d| d.content))
        else {
            tracing::warn!(index, "skipping history entry without type or content");
            continue;
        };
        if kind.is_empty() || content.is_empty() {
            tracing::warn!(index, "skipping history entry without type or content");
            continue;
        }

        let role = match kind.as_str() {
            "system" => continue,
            "human" => Role::Human,
            _ => Role::Bot,
        };
        messages.push(Message { role, content });
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_roles() {
        let json = r#"[
            {"type": "system", "data": {"content": "You are MAVIS"}},
            {"type": "human", "data": {"content": "hi"}},
            {"type": "ai", "data": {"content": "hello"}}
        ]"#;
        let messages = parse_history(json).unwrap();
        assert_eq!(messages, vec![Message::human("hi"), Message::bot("hello")]);
    }

    #[test]
    fn test_parse_history_skips_invalid_entries() {
        let json = r#"[
            42,
            {"type": "human"},
            {"data": {"content": "no type"}},
            {"type": "human", "data": {"content": ""}},
            {"type": "ai", "data": {"content": ["parts"]}},
            {"type": "ai", "data": {"content": "kept"}}
        ]"#;
        let messages = parse_history(json).unwrap();
        assert_eq!(messages, vec![Message::bot("kept")]);
    }

    #[test]
    fn test_parse_history_rejects_non_array() {
        let err = parse_history(r#"{"type": "human"}"#).unwrap_err();
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_parse_history_rejects_bad_json() {
        let err = parse_history("not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse history JSON"));
    }

    #[test]
    fn test_parse_history_empty_array() {
        assert!(parse_history("[]").unwrap().is_empty());
    }
}
