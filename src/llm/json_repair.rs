//! JSON Repair (C2): a small deliberate pre-processing state machine that
//! tolerates the common ways LLMs mangle JSON, followed by one
//! `serde_json::from_str` call — this module never hand-rolls a parser.
//!
//! Grounded on `weavegraph::utils::json_ext` for the manipulation style
//! (small composable pure functions over `serde_json::Value`/`&str`) and
//! on the ad-hoc strip-then-parse pattern inline in the original Python
//! agents' `parse_llm_json_response`, generalized into named stages per
//! spec REDESIGN FLAGS.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JsonRepairError {
    #[error("no JSON object or array found in response")]
    NoJsonFound,
    #[error("repaired text still failed to parse: {0}")]
    StillInvalid(String),
}

/// Runs the full repair pipeline and parses the result.
pub fn repair_json(raw: &str) -> Result<Value, JsonRepairError> {
    // Fast path: already valid.
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(value);
    }

    let stripped = strip_code_fences(raw);
    let extracted = extract_json_span(&stripped).ok_or(JsonRepairError::NoJsonFound)?;
    let normalized = normalize_quotes(&extracted);
    let comma_free = remove_trailing_commas(&normalized);

    serde_json::from_str(&comma_free).map_err(|e| JsonRepairError::StillInvalid(e.to_string()))
}

/// Strips ```json ... ``` / ``` ... ``` fences, keeping only the interior.
/// If no fence is present, the input is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.strip_prefix('\n').unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim().to_string();
        }
        return rest.trim().to_string();
    }
    trimmed.to_string()
}

/// Finds the first balanced `{...}` or `[...]` span by bracket counting,
/// ignoring brackets inside string literals. This is what lets the repair
/// pipeline recover JSON embedded in conversational prose ("Here is the
/// analysis: { ... } Let me know if...").
pub fn extract_json_span(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|b| *b == b'{' || *b == b'[')?;
    let opening = bytes[start];
    let closing = if opening == b'{' { b'}' } else { b']' };

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b if b == opening => depth += 1,
            b if b == closing => {
                depth -= 1;
                if depth == 0 {
                    return std::str::from_utf8(&bytes[start..=i]).ok().map(str::to_string);
                }
            }
            _ => {}
        }
    }
    None
}

/// Converts single-quoted keys/strings to double quotes when the text
/// contains no double quotes at all — a narrow, safe heuristic: mixed
/// quoting is left untouched rather than risk corrupting legitimate
/// apostrophes inside already-valid JSON strings.
pub fn normalize_quotes(text: &str) -> String {
    if text.contains('"') {
        return text.to_string();
    }
    text.replace('\'', "\"")
}

/// Removes trailing commas before a closing `}` or `]`, the single most
/// common LLM JSON mistake.
pub fn remove_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut in_string = false;
    let mut escaped = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            result.push(c);
            i += 1;
            continue;
        }
        if c == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
                i += 1;
                continue;
            }
        }
        result.push(c);
        i += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_passes_through_untouched() {
        let value = repair_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_code_fence_with_language_tag() {
        let raw = "```json\n{\"a\": 1}\n```";
        let value = repair_json(raw).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn extracts_json_embedded_in_prose() {
        let raw = "Sure thing! Here is the result: {\"losses\": [\"L-1\"]} Hope that helps.";
        let value = repair_json(raw).unwrap();
        assert_eq!(value["losses"][0], "L-1");
    }

    #[test]
    fn removes_trailing_comma_in_object_and_array() {
        let raw = r#"{"a": [1, 2,], "b": 3,}"#;
        let value = repair_json(raw).unwrap();
        assert_eq!(value["a"][1], 2);
        assert_eq!(value["b"], 3);
    }

    #[test]
    fn reports_no_json_found() {
        let err = repair_json("just some prose with no braces at all").unwrap_err();
        assert_eq!(err, JsonRepairError::NoJsonFound);
    }

    #[test]
    fn ignores_brackets_inside_strings() {
        let raw = r#"{"note": "use [brackets] like this", "n": 1}"#;
        let value = repair_json(raw).unwrap();
        assert_eq!(value["n"], 1);
    }
}
