//! Update-versus-query classification of a user utterance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keywords::{field_keywords, matching_terms, tokenize, UPDATE_KEYWORDS};
use super::model_reply::first_json_object;
use super::schema::TripField;

/// What the user is doing with this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Correcting a field that was already supplied.
    Update,
    /// Anything else: new information, questions, chit-chat.
    NormalQuery,
}

impl Intent {
    pub fn is_update(&self) -> bool {
        matches!(self, Intent::Update)
    }
}

/// Where the final intent came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    Model,
    Keywords,
    /// The model call failed; defaulted to a normal query.
    Default,
}

/// Keyword scan over one utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordScan {
    /// Generic update terms found.
    pub update_terms: Vec<&'static str>,
    /// Fields whose trigger words were found, in schema order.
    pub fields: Vec<TripField>,
}

impl KeywordScan {
    pub fn scan(utterance: &str) -> Self {
        let tokens = tokenize(utterance);
        let update_terms = matching_terms(&tokens, UPDATE_KEYWORDS);
        let fields = TripField::ALL
            .into_iter()
            .filter(|f| !matching_terms(&tokens, field_keywords(*f)).is_empty())
            .collect();
        Self {
            update_terms,
            fields,
        }
    }

    /// Any match at all means update.
    pub fn intent(&self) -> Intent {
        if self.update_terms.is_empty() && self.fields.is_empty() {
            Intent::NormalQuery
        } else {
            Intent::Update
        }
    }
}

/// Final classification for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub source: IntentSource,
    /// Always computed; used to name the fields being edited.
    pub scan: KeywordScan,
}

impl Classification {
    /// Classification from keywords alone.
    pub fn from_keywords(utterance: &str) -> Self {
        let scan = KeywordScan::scan(utterance);
        Self {
            intent: scan.intent(),
            source: IntentSource::Keywords,
            scan,
        }
    }

    /// Classification decided by the model; the keyword scan is kept.
    pub fn from_model(intent: Intent, scan: KeywordScan) -> Self {
        Self {
            intent,
            source: IntentSource::Model,
            scan,
        }
    }

    /// Non-blocking default after a model failure.
    pub fn defaulted(scan: KeywordScan) -> Self {
        Self {
            intent: Intent::NormalQuery,
            source: IntentSource::Default,
            scan,
        }
    }
}

/// Reads `{"status": "update"|"normal_query", "updated_status": "YES"|"NO"}`.
///
/// `status` wins when present; `updated_status` alone is accepted too.
/// Returns `None` when neither can be read.
pub fn parse_model_intent(raw: &str) -> Option<Intent> {
    let obj = first_json_object(raw)?;

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase());
    match status.as_deref() {
        Some("update") => return Some(Intent::Update),
        Some("normal_query") | Some("normal query") => return Some(Intent::NormalQuery),
        _ => {}
    }

    let flag = obj
        .get("updated_status")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_uppercase());
    match flag.as_deref() {
        Some("YES") => Some(Intent::Update),
        Some("NO") => Some(Intent::NormalQuery),
        _ => None,
    }
}
