//! Pull a JSON document out of free-text model output.
//!
//! Models asked for JSON frequently wrap it in a fenced block or surround it
//! with commentary. The first fenced block wins; otherwise the first balanced
//! object or array is taken.

use serde::de::DeserializeOwned;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonExtractError {
    #[error("no JSON found in model reply")]
    NoJson,

    #[error("unbalanced JSON in model reply")]
    Unbalanced,

    #[error("model reply is not the expected JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl From<JsonExtractError> for AppError {
    fn from(err: JsonExtractError) -> Self {
        AppError::BadGateway(err.to_string())
    }
}

pub fn extract_json<T: DeserializeOwned>(reply: &str) -> Result<T, JsonExtractError> {
    let Some(block) = fenced_block(reply) else {
        return Ok(serde_json::from_str(balanced_slice(reply)?)?);
    };
    match serde_json::from_str(block) {
        Ok(value) => Ok(value),
        // A fence can still carry stray text, e.g. a tag on the same line.
        Err(e) => match balanced_slice(block) {
            Ok(slice) => Ok(serde_json::from_str(slice)?),
            Err(_) => Err(e.into()),
        },
    }
}

/// Contents of the first ``` fence, with an optional `json` language tag.
fn fenced_block(reply: &str) -> Option<&str> {
    let start = reply.find("```")?;
    let after_fence = &reply[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let tag = after_fence[..body_start].trim();
    if !(tag.is_empty() || tag.eq_ignore_ascii_case("json")) {
        return None;
    }
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    let block = body[..end].trim();
    (!block.is_empty()).then_some(block)
}

/// From the first `{` or `[` to its matching close, skipping brackets that
/// appear inside string literals.
fn balanced_slice(reply: &str) -> Result<&str, JsonExtractError> {
    let start = reply
        .find(['{', '['])
        .ok_or(JsonExtractError::NoJson)?;

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in reply[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return Err(JsonExtractError::Unbalanced);
                }
                if stack.is_empty() {
                    return Ok(&reply[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    Err(JsonExtractError::Unbalanced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Titles {
        titles: Vec<String>,
    }

    #[test]
    fn fenced_json_block() {
        let reply = "Here you go:\n```json\n{\"titles\": [\"Tides\"]}\n```\nEnjoy!";
        let parsed: Titles = extract_json(reply).unwrap();
        assert_eq!(parsed.titles, vec!["Tides"]);
    }

    #[test]
    fn untagged_fence() {
        let reply = "```\n{\"titles\": []}\n```";
        let parsed: Titles = extract_json(reply).unwrap();
        assert!(parsed.titles.is_empty());
    }

    #[test]
    fn single_line_fence_with_tag() {
        let reply = "```json {\"titles\": [\"Tides\"]}```";
        let parsed: Titles = extract_json(reply).unwrap();
        assert_eq!(parsed.titles, vec!["Tides"]);
    }

    #[test]
    fn object_surrounded_by_prose() {
        let reply = "Sure! {\"titles\": [\"Salt\", \"Light\"]} Let me know.";
        let parsed: Titles = extract_json(reply).unwrap();
        assert_eq!(parsed.titles, vec!["Salt", "Light"]);
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let reply = r#"{"titles": ["A } tricky [ one", "Quote \" and }"]} trailing }"#;
        let parsed: Titles = extract_json(reply).unwrap();
        assert_eq!(parsed.titles[0], "A } tricky [ one");
        assert_eq!(parsed.titles[1], "Quote \" and }");
    }

    #[test]
    fn top_level_array() {
        let reply = "Result: [1, 2, 3] done";
        let parsed: Vec<u32> = extract_json(reply).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn no_json_at_all() {
        let result: Result<Titles, _> = extract_json("I could not think of anything.");
        assert!(matches!(result, Err(JsonExtractError::NoJson)));
    }

    #[test]
    fn truncated_json_is_unbalanced() {
        let result: Result<Titles, _> = extract_json("{\"titles\": [\"Half");
        assert!(matches!(result, Err(JsonExtractError::Unbalanced)));
    }

    #[test]
    fn mismatched_close_is_unbalanced() {
        let result: Result<Titles, _> = extract_json("{\"titles\": [\"x\"}");
        assert!(matches!(result, Err(JsonExtractError::Unbalanced)));
    }

    #[test]
    fn wrong_shape_is_invalid() {
        let result: Result<Titles, _> = extract_json("{\"names\": []}");
        assert!(matches!(result, Err(JsonExtractError::Invalid(_))));
    }
}
