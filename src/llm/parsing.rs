//! Structured-output parsing for LLM completions
//!
//! Completions are expected to carry a single JSON object, but models wrap
//! it in markdown fences, prepend reasoning blocks, or add chatter around it.
//! This module normalizes the text, isolates the object, and deserializes it
//! into a typed schema. Failures come back as a reason string so callers can
//! apply their documented fallback instead of unwinding.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").expect("fence pattern is a valid regex")
    })
}

/// Drop `<think>...</think>` reasoning blocks emitted by reasoning models.
///
/// An unclosed `<think>` keeps whatever follows it, since the answer may
/// have been appended without the closing tag.
fn strip_think_tags(text: &str) -> &str {
    // ASCII lowering keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();
    if let Some(end) = lower.rfind("</think>") {
        return text[end + "</think>".len()..].trim();
    }
    if let Some(start) = lower.find("<think>") {
        return text[start + "<think>".len()..].trim();
    }
    text.trim()
}

/// Locate the JSON object inside a completion.
///
/// Prefers the body of the first fenced block; falls back to the span from
/// the first `{` to the last `}`.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_think_tags(text);

    let body = fence_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

/// Deserialize the JSON object embedded in `text` into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    if text.trim().is_empty() {
        return Err("empty completion".to_string());
    }
    let json = extract_json_object(text).ok_or_else(|| "no JSON object found".to_string())?;
    serde_json::from_str(json).map_err(|e| format!("schema mismatch: {e}"))
}
