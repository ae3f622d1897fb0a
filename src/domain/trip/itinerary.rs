//! Itinerary generation preconditions, the generated document, and the
//! policy deciding when a turn should (re)generate it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use super::intent::Intent;
use super::record::TripRecord;
use super::schema::TripField;
use crate::domain::foundation::Timestamp;

/// Errors raised while producing an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("cannot generate an itinerary, missing fields: {}", join_fields(.missing))]
    IncompleteRecord { missing: Vec<TripField> },

    #[error("itinerary generation failed: {0}")]
    Provider(String),
}

fn join_fields(fields: &[TripField]) -> String {
    fields
        .iter()
        .map(TripField::name)
        .collect::<Vec<_>>()
        .join(", ")
}

const ITINERARY_TEMPLATE: &str = "\
You are a travel planner writing a complete day-by-day itinerary.

Trip details:
- Destination: {destination}
- Departing from: {departure}
- Travel period: {travel_period}
- Travelers: {people}
- Budget: {budget}
- Accommodation: {accommodation}
- Activities: {activities}
- Food preferences: {food}

Rules:
- Write exactly {day_count} day sections, no more and no fewer.
- Title each section \"Day N\" where N runs from 1 to {day_count}.
- Fit the activities, food and accommodation preferences into the days.
- Keep the plan within the budget and mention approximate costs.
- End with a short packing and travel tips section.";

/// Renders the generation prompt for a complete record.
///
/// Every schema field is substituted verbatim. Any missing field aborts the
/// render with [`GenerationError::IncompleteRecord`]; nothing is truncated.
pub fn render_itinerary_prompt(record: &TripRecord) -> Result<String, GenerationError> {
    let missing = record.missing_fields();
    if !missing.is_empty() {
        return Err(GenerationError::IncompleteRecord { missing });
    }

    let mut values = Vec::with_capacity(TripField::ALL.len() + 1);
    for field in TripField::ALL {
        let value = record
            .display_value(field)
            .ok_or_else(|| GenerationError::IncompleteRecord {
                missing: vec![field],
            })?;
        values.push((field.name(), value));
    }

    let day_count = record
        .travel_days()
        .map(|d| d.to_string())
        .or_else(|| record.display_value(TripField::TravelPeriod))
        .unwrap_or_default();
    values.push(("day_count", day_count));

    Ok(fill_placeholders(ITINERARY_TEMPLATE, &values))
}

/// Replaces `{name}` placeholders in a single left-to-right pass.
///
/// Substituted text is never rescanned, so braces inside user values stay
/// literal. Unknown `{...}` sequences are copied through.
fn fill_placeholders(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let known = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end, value))
        });
        match known {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// A generated itinerary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub content: String,
    pub generated_at: Timestamp,
}

impl Itinerary {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            generated_at: Timestamp::now(),
        }
    }

    /// Distinct day numbers found in `Day N` headings.
    ///
    /// A heading is a line that, after markdown markers (`#`, `*`, `-`) are
    /// stripped, starts with "Day" followed by a number.
    pub fn day_numbers(&self) -> BTreeSet<u32> {
        self.content
            .lines()
            .filter_map(|line| {
                let line = line.trim_start_matches(|c: char| {
                    c == '#' || c == '*' || c == '-' || c.is_whitespace()
                });
                let rest = line
                    .strip_prefix("Day ")
                    .or_else(|| line.strip_prefix("DAY "))?;
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            })
            .collect()
    }

    pub fn day_count(&self) -> usize {
        self.day_numbers().len()
    }

    /// True when the headings are exactly `Day 1` through `Day N`.
    pub fn covers_exactly(&self, days: u32) -> bool {
        self.day_numbers() == (1..=days).collect()
    }
}

/// When an already-complete record should produce a fresh itinerary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationPolicy {
    /// Only on the incomplete to complete transition.
    OnTransition,
    /// On the transition, and on later update turns that change the record.
    #[default]
    OnUpdate,
    /// On every turn that leaves the record complete.
    EveryTurn,
}

/// Decides whether this turn triggers itinerary generation.
pub fn should_generate(
    was_complete: bool,
    now_complete: bool,
    intent: Intent,
    changed: bool,
    policy: RegenerationPolicy,
) -> bool {
    if !now_complete {
        return false;
    }
    if !was_complete {
        return true;
    }
    match policy {
        RegenerationPolicy::OnTransition => false,
        RegenerationPolicy::OnUpdate => intent.is_update() && changed,
        RegenerationPolicy::EveryTurn => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> TripRecord {
        let mut record = TripRecord::new();
        record.set_scalar(TripField::Destination, "Kyoto");
        record.set_scalar(TripField::Departure, "Osaka");
        record.set_scalar(TripField::TravelPeriod, "5 days");
        record.set_scalar(TripField::People, "2");
        record.set_scalar(TripField::Budget, "$4000");
        record.set_scalar(TripField::Accommodation, "ryokan");
        record.activities.insert("temples".into());
        record.activities.insert("tea ceremony".into());
        record.set_scalar(TripField::Food, "vegetarian");
        record
    }

    mod prompt {
        use super::*;

        #[test]
        fn substitutes_every_field() {
            let prompt = render_itinerary_prompt(&complete_record()).unwrap();

            for value in ["Kyoto", "Osaka", "5 days", "$4000", "ryokan", "tea ceremony, temples", "vegetarian"] {
                assert!(prompt.contains(value), "prompt is missing {}", value);
            }
            assert!(prompt.contains("exactly 5 day sections"));
            assert!(!prompt.contains('{'));
        }

        #[test]
        fn braces_in_user_values_are_not_substituted() {
            let mut record = complete_record();
            record.set_scalar(TripField::Destination, "{food} island");
            record.set_scalar(TripField::Accommodation, "hostel {day_count}");

            let prompt = render_itinerary_prompt(&record).unwrap();

            assert!(prompt.contains("- Destination: {food} island"));
            assert!(prompt.contains("- Accommodation: hostel {day_count}"));
            assert!(prompt.contains("exactly 5 day sections"));
        }

        #[test]
        fn unknown_placeholders_are_copied_through() {
            let values = vec![("name", "Kyoto".to_string())];
            assert_eq!(
                fill_placeholders("{name} {other} {", &values),
                "Kyoto {other} {"
            );
        }

        #[test]
        fn fails_loudly_on_missing_field() {
            let mut record = complete_record();
            record.food = None;
            record.activities.clear();

            let err = render_itinerary_prompt(&record).unwrap_err();

            assert_eq!(
                err,
                GenerationError::IncompleteRecord {
                    missing: vec![TripField::Activities, TripField::Food]
                }
            );
            assert_eq!(
                err.to_string(),
                "cannot generate an itinerary, missing fields: activities, food"
            );
        }
    }

    mod day_count {
        use super::*;

        #[test]
        fn counts_markdown_headings() {
            let itinerary = Itinerary::new(
                "# Your trip\n## Day 1: Arrival\nCheck in.\n## Day 2 - Temples\n**Day 3**: Departure\n",
            );
            assert_eq!(itinerary.day_count(), 3);
            assert!(itinerary.covers_exactly(3));
            assert!(!itinerary.covers_exactly(4));
        }

        #[test]
        fn ignores_day_mentions_inside_text() {
            let itinerary = Itinerary::new("Day 1\nOn day 2 you could rest.\nA day trip to Nara.");
            assert_eq!(itinerary.day_count(), 1);
        }

        #[test]
        fn repeated_heading_counts_once() {
            let itinerary = Itinerary::new("Day 1\nDay 1 (evening)\nDay 2");
            assert_eq!(itinerary.day_count(), 2);
        }
    }

    mod policy {
        use super::*;

        #[test]
        fn never_generates_while_incomplete() {
            for policy in [
                RegenerationPolicy::OnTransition,
                RegenerationPolicy::OnUpdate,
                RegenerationPolicy::EveryTurn,
            ] {
                assert!(!should_generate(false, false, Intent::Update, true, policy));
                assert!(!should_generate(true, false, Intent::Update, true, policy));
            }
        }

        #[test]
        fn always_generates_on_transition() {
            for policy in [
                RegenerationPolicy::OnTransition,
                RegenerationPolicy::OnUpdate,
                RegenerationPolicy::EveryTurn,
            ] {
                assert!(should_generate(false, true, Intent::NormalQuery, true, policy));
            }
        }

        #[test]
        fn on_update_requires_update_intent_and_change() {
            let p = RegenerationPolicy::OnUpdate;
            assert!(should_generate(true, true, Intent::Update, true, p));
            assert!(!should_generate(true, true, Intent::Update, false, p));
            assert!(!should_generate(true, true, Intent::NormalQuery, true, p));
        }

        #[test]
        fn on_transition_ignores_later_edits() {
            let p = RegenerationPolicy::OnTransition;
            assert!(!should_generate(true, true, Intent::Update, true, p));
        }

        #[test]
        fn every_turn_regenerates_when_complete() {
            let p = RegenerationPolicy::EveryTurn;
            assert!(should_generate(true, true, Intent::NormalQuery, false, p));
        }

        #[test]
        fn default_is_on_update() {
            assert_eq!(RegenerationPolicy::default(), RegenerationPolicy::OnUpdate);
        }
    }
}
