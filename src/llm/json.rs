//! Lenient decoding of tool-call arguments.
//!
//! Models sometimes wrap arguments in markdown fences or surround them with
//! prose. The arguments are advisory, so anything undecodable becomes an
//! empty object instead of an error.

use serde_json::{Map, Value};
use tracing::debug;

/// Decode a tool-call argument string into a JSON object.
///
/// Tries, in order:
/// 1. The whole string as JSON
/// 2. The body of a ` ```json ` or bare ` ``` ` fenced block
/// 3. The first balanced `{...}` object found in the text
///
/// Non-object values and undecodable input yield `{}`.
pub fn parse_tool_arguments(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return empty_object();
    }

    let candidates = [
        Some(trimmed.to_string()),
        fenced_block(trimmed),
        first_balanced_object(trimmed),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&candidate) {
            return value;
        }
    }

    debug!("Ignoring undecodable tool arguments: {}", trimmed);
    empty_object()
}

/// Normalize arguments that arrive as an already-decoded JSON value.
///
/// Some OpenAI-compatible servers send `arguments` as an object rather than
/// a string.
pub fn normalize_tool_arguments(value: &Value) -> Value {
    match value {
        Value::Object(_) => value.clone(),
        Value::String(raw) => parse_tool_arguments(raw),
        _ => empty_object(),
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn fenced_block(text: &str) -> Option<String> {
    let (open, skip) = match text.find("```json") {
        Some(start) => (start, 7),
        None => (text.find("```")?, 3),
    };
    let body = &text[open + skip..];
    let end = body.find("```")?;
    Some(body[..end].trim().to_string())
}

/// The first `{...}` substring with balanced braces, ignoring braces inside
/// string literals.
fn first_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let candidate = &text[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (idx, ch) in candidate.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(candidate[..=idx].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
