//! Named trigger-word tables used by intent detection and activity merging.
//!
//! Matching is done on whole lowercase word tokens, so "just" does not match
//! "adjust" and "add" does not match "address". Multi-word terms such as
//! "instead of" must appear as consecutive tokens.

use super::schema::TripField;

/// Words signalling the user is correcting something already supplied.
pub const UPDATE_KEYWORDS: &[&str] = &[
    "update",
    "change",
    "modify",
    "instead of",
    "replace",
    "only",
    "just",
];

/// Words signalling an activity edit adds to the list rather than replacing it.
///
/// Inflections are listed out so whole-token matching still catches them.
pub const ADDITION_KEYWORDS: &[&str] = &[
    "add",
    "adds",
    "added",
    "adding",
    "include",
    "includes",
    "included",
    "including",
    "also",
];

/// Per-field trigger words.
pub fn field_keywords(field: TripField) -> &'static [&'static str] {
    match field {
        TripField::Destination => &["destination", "place", "location", "city", "country"],
        TripField::Departure => &["departure", "depart", "departing", "leaving", "starting point"],
        TripField::TravelPeriod => &["day", "days", "duration", "period", "length", "time"],
        TripField::People => &["people", "travelers", "travellers", "guests", "persons", "group"],
        TripField::Budget => &["budget", "cost", "money", "spend", "rupees", "dollars"],
        TripField::Accommodation => &["hotel", "resort", "stay", "accommodation", "room"],
        TripField::Activities => &["activity", "activities", "do", "visit", "see", "experience"],
        TripField::Food => &["food", "meal", "eat", "cuisine", "restaurant", "diet"],
    }
}

/// Lowercase word tokens of an utterance.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a single or multi-word term occurs in the token stream.
pub fn contains_term(tokens: &[String], term: &str) -> bool {
    let needle: Vec<&str> = term.split_whitespace().collect();
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(needle.len())
        .any(|window| window.iter().zip(&needle).all(|(t, n)| t == n))
}

/// Terms from `table` found in `tokens`, in table order.
pub fn matching_terms(tokens: &[String], table: &[&'static str]) -> Vec<&'static str> {
    table
        .iter()
        .copied()
        .filter(|term| contains_term(tokens, term))
        .collect()
}

/// True when the utterance asks to add activities rather than replace them.
pub fn has_addition_keyword(utterance: &str) -> bool {
    let tokens = tokenize(utterance);
    !matching_terms(&tokens, ADDITION_KEYWORDS).is_empty()
}
