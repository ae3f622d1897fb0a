//! Interpreting the model's structured-extraction output.
//!
//! The model is asked for `{"response": ..., "extracted_data": {...}}` but
//! may wrap it in prose, fence it in markdown, return a bare field map, or
//! return plain text. Parsing runs through explicit stages and always ends
//! in a [`ModelReply`]; it never fails.

use serde_json::{Map, Value};

use super::record::TripRecord;
use super::schema::TripField;

const REPLY_KEY: &str = "response";
const DATA_KEY: &str = "extracted_data";

/// Stage at which a structured payload was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    /// The whole text was a JSON object.
    Direct,
    /// The object was found inside a fenced block or surrounding prose.
    Embedded,
}

/// A reply the model produced in the expected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredReply {
    /// User-facing text, when the payload carried one.
    pub reply: Option<String>,
    /// Fields proposed by this turn.
    pub candidate: TripRecord,
    pub stage: ParseStage,
}

/// Outcome of interpreting one model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Structured(StructuredReply),
    /// Nothing usable; the raw text is shown to the user as-is.
    Fallback(String),
}

impl ModelReply {
    /// Runs the parse stages over `raw`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return match value.as_object().and_then(interpret) {
                Some((reply, candidate)) => ModelReply::Structured(StructuredReply {
                    reply,
                    candidate,
                    stage: ParseStage::Direct,
                }),
                None => ModelReply::Fallback(raw.to_string()),
            };
        }

        if let Some((reply, candidate)) = embedded_objects(trimmed)
            .iter()
            .filter_map(|obj| interpret(obj))
            .next()
        {
            return ModelReply::Structured(StructuredReply {
                reply,
                candidate,
                stage: ParseStage::Embedded,
            });
        }

        ModelReply::Fallback(raw.to_string())
    }

    /// Candidate fields; empty for a fallback.
    pub fn candidate(&self) -> TripRecord {
        match self {
            ModelReply::Structured(s) => s.candidate.clone(),
            ModelReply::Fallback(_) => TripRecord::new(),
        }
    }

    /// User-facing reply text, if any was produced.
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            ModelReply::Structured(s) => s.reply.as_deref(),
            ModelReply::Fallback(raw) => Some(raw.as_str()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ModelReply::Fallback(_))
    }
}

/// Maps a JSON object to `(reply, candidate)`, or `None` when it has
/// neither the expected keys nor any schema field.
fn interpret(obj: &Map<String, Value>) -> Option<(Option<String>, TripRecord)> {
    let has_reply = obj.contains_key(REPLY_KEY);
    let has_data = obj.contains_key(DATA_KEY);

    if has_reply || has_data {
        let reply = obj
            .get(REPLY_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let candidate = obj.get(DATA_KEY).map(data_to_record).unwrap_or_default();
        return Some((reply, candidate));
    }

    let has_schema_key = TripField::ALL.iter().any(|f| obj.contains_key(f.name()));
    if has_schema_key {
        return Some((None, TripRecord::from_json_map(obj)));
    }

    None
}

fn data_to_record(value: &Value) -> TripRecord {
    match value {
        Value::Object(map) => TripRecord::from_json_map(map),
        // Some models double-encode the data object.
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => TripRecord::from_json_map(&map),
            _ => TripRecord::new(),
        },
        _ => TripRecord::new(),
    }
}

/// First JSON object in `raw`, whole text first, then embedded.
pub(crate) fn first_json_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Some(map);
    }
    embedded_objects(trimmed).into_iter().next()
}

/// JSON objects found inside `s`: fenced blocks first, then each balanced
/// `{...}` span in order of appearance.
fn embedded_objects(s: &str) -> Vec<Map<String, Value>> {
    let mut found = Vec::new();

    if let Some(block) = extract_from_code_block(s) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&block) {
            found.push(map);
        }
    }

    for (start, _) in s.match_indices('{') {
        if let Some(candidate) = extract_balanced_json(s, start) {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&candidate) {
                found.push(map);
            }
        }
    }

    found
}

fn extract_from_code_block(s: &str) -> Option<String> {
    // ```json ... ``` or ``` ... ```
    let patterns = ["```json\n", "```json\r\n", "```\n", "```\r\n"];

    for pattern in patterns {
        if let Some(start) = s.find(pattern) {
            let json_start = start + pattern.len();
            if let Some(end) = s[json_start..].find("```") {
                return Some(s[json_start..json_start + end].trim().to_string());
            }
        }
    }
    None
}

fn extract_balanced_json(s: &str, start: usize) -> Option<String> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(s[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
