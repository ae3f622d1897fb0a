//! The accumulated trip record and its coercion from loosely-typed JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::schema::TripField;

/// Field values collected so far for one session.
///
/// A field is present iff its value is non-empty; `None`, an empty string
/// and an empty activity set are all the same "missing" state. Keys outside
/// the schema are kept in `extras` but never count towards completeness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub activities: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<String>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl TripRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from a model-produced JSON object.
    ///
    /// Numbers and booleans become text, lists given for a scalar field are
    /// joined with ", ", a plain string given for `activities` becomes a
    /// one-element set, and null or blank values are dropped.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut record = TripRecord::new();
        for (key, value) in map {
            match key.parse::<TripField>() {
                Ok(TripField::Activities) => {
                    record.activities = coerce_items(value);
                }
                Ok(field) => {
                    if let Some(slot) = record.scalar_slot(field) {
                        *slot = coerce_text(value);
                    }
                }
                Err(_) if !value.is_null() => {
                    record.extras.insert(key.clone(), value.clone());
                }
                Err(_) => {}
            }
        }
        record
    }

    /// Text value of a scalar field, if present.
    ///
    /// Always `None` for `activities`; use the `activities` set directly.
    pub fn scalar(&self, field: TripField) -> Option<&str> {
        let value = match field {
            TripField::Destination => &self.destination,
            TripField::Departure => &self.departure,
            TripField::TravelPeriod => &self.travel_period,
            TripField::People => &self.people,
            TripField::Budget => &self.budget,
            TripField::Accommodation => &self.accommodation,
            TripField::Food => &self.food,
            TripField::Activities => return None,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    /// Sets a scalar field. Blank values clear it.
    ///
    /// Ignored for `activities`.
    pub fn set_scalar(&mut self, field: TripField, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        if let Some(slot) = self.scalar_slot(field) {
            *slot = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
    }

    fn scalar_slot(&mut self, field: TripField) -> Option<&mut Option<String>> {
        match field {
            TripField::Destination => Some(&mut self.destination),
            TripField::Departure => Some(&mut self.departure),
            TripField::TravelPeriod => Some(&mut self.travel_period),
            TripField::People => Some(&mut self.people),
            TripField::Budget => Some(&mut self.budget),
            TripField::Accommodation => Some(&mut self.accommodation),
            TripField::Food => Some(&mut self.food),
            TripField::Activities => None,
        }
    }

    /// Whether the field holds a non-empty value.
    pub fn is_present(&self, field: TripField) -> bool {
        match field {
            TripField::Activities => !self.activities.is_empty(),
            other => self.scalar(other).is_some(),
        }
    }

    /// Fields still missing, in schema order.
    pub fn missing_fields(&self) -> Vec<TripField> {
        TripField::ALL
            .into_iter()
            .filter(|f| !self.is_present(*f))
            .collect()
    }

    /// True when every schema field is present.
    pub fn is_complete(&self) -> bool {
        TripField::ALL.iter().all(|f| self.is_present(*f))
    }

    /// Number of schema fields carrying a value.
    pub fn present_count(&self) -> usize {
        TripField::ALL.iter().filter(|f| self.is_present(**f)).count()
    }

    /// Value rendered as prompt text; activities are joined with ", ".
    pub fn display_value(&self, field: TripField) -> Option<String> {
        match field {
            TripField::Activities if self.activities.is_empty() => None,
            TripField::Activities => Some(
                self.activities
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => self.scalar(other).map(str::to_string),
        }
    }

    /// Trip length in days implied by `travel_period`.
    ///
    /// Reads the first whole number in the text; a number followed by
    /// "week" or "weeks" is multiplied by seven.
    pub fn travel_days(&self) -> Option<u32> {
        let text = self.scalar(TripField::TravelPeriod)?.to_lowercase();
        let start = text.find(|c: char| c.is_ascii_digit())?;
        let digits: String = text[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let number: u32 = digits.parse().ok()?;
        let rest = text[start + digits.len()..].trim_start();
        if rest.starts_with("week") {
            number.checked_mul(7)
        } else {
            Some(number)
        }
    }

    /// Serializes the record to a JSON object value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(coerce_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn coerce_items(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_text).collect(),
        other => coerce_text(other).into_iter().collect(),
    }
}
