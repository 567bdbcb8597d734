//! Parsing of model replies into structured summaries.
//!
//! Models wrap their JSON in prose or markdown fences often enough that the reply is
//! treated as free text with an embedded object. Parsing never fails: anything that
//! cannot be read as an object becomes a plain-text summary.

use podcast_datastore::Timestamp;
use serde_json::Value;

use crate::llm::prompt::truncate_chars;

pub const FALLBACK_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryPayload {
    pub summary: String,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
    pub timestamps: Vec<Timestamp>,
    /// Whether the payload came from a JSON object rather than the raw-text fallback.
    pub structured: bool,
}

impl SummaryPayload {
    fn raw_text(reply: &str) -> Self {
        SummaryPayload {
            summary: truncate_chars(reply, FALLBACK_SUMMARY_CHARS).to_string(),
            ..Default::default()
        }
    }

    fn from_object(object: &Value) -> Self {
        SummaryPayload {
            summary: object["summary"].as_str().unwrap_or_default().trim().to_string(),
            key_points: string_list(&object["key_points"]),
            keywords: string_list(&object["keywords"]),
            timestamps: object["timestamps"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| {
                            serde_json::from_value::<Timestamp>(item.clone())
                                .inspect_err(|e| tracing::debug!(error = %e, "Dropping timestamp"))
                                .ok()
                        })
                        .collect()
                })
                .unwrap_or_default(),
            structured: true,
        }
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Span from the first `{` to the last `}`.
fn outer_block(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// The balanced object starting at the first `{`, skipping braces inside strings.
fn balanced_block(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in reply[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&reply[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn parse_reply(reply: &str) -> SummaryPayload {
    let parsed = [outer_block(reply), balanced_block(reply)]
        .into_iter()
        .flatten()
        .find_map(|block| serde_json::from_str::<Value>(block).ok())
        .filter(Value::is_object);

    match parsed {
        Some(object) => SummaryPayload::from_object(&object),
        None => {
            tracing::warn!(
                reply_chars = reply.chars().count(),
                "Model reply holds no JSON object, keeping it as plain text"
            );
            SummaryPayload::raw_text(reply)
        }
    }
}
