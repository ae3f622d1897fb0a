//! The fixed set of slots a trip plan needs before an itinerary can be built.
//!
//! `TripField::ALL` is the only source of truth for which fields exist and
//! in what order they are asked for. Both the extraction prompt and the
//! reconciliation engine iterate it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Inclusive bounds for the trip length, in days.
pub const MIN_TRAVEL_DAYS: u32 = 3;
pub const MAX_TRAVEL_DAYS: u32 = 15;

/// One required slot of the trip record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripField {
    Destination,
    Departure,
    TravelPeriod,
    People,
    Budget,
    Accommodation,
    Activities,
    Food,
}

impl TripField {
    /// All fields in the order they are collected.
    pub const ALL: [TripField; 8] = [
        TripField::Destination,
        TripField::Departure,
        TripField::TravelPeriod,
        TripField::People,
        TripField::Budget,
        TripField::Accommodation,
        TripField::Activities,
        TripField::Food,
    ];

    /// Key used in JSON payloads and prompts.
    pub fn name(&self) -> &'static str {
        match self {
            TripField::Destination => "destination",
            TripField::Departure => "departure",
            TripField::TravelPeriod => "travel_period",
            TripField::People => "people",
            TripField::Budget => "budget",
            TripField::Accommodation => "accommodation",
            TripField::Activities => "activities",
            TripField::Food => "food",
        }
    }

    /// Question asked when this field is the next one missing.
    pub fn question(&self) -> &'static str {
        match self {
            TripField::Destination => "Where are you dreaming of going for this trip?",
            TripField::Departure => "Where will you be starting your journey from?",
            TripField::TravelPeriod => "How long are you planning to travel? (Pick between 3 and 15 days.)",
            TripField::People => "Who's coming along? Just you, or is it a group trip?",
            TripField::Budget => "Got a budget in mind? A number or a rough range in USD works.",
            TripField::Accommodation => "What kind of stay are you imagining? Cozy, luxurious, or something unique?",
            TripField::Activities => "Any must-do experiences or sights on your wishlist?",
            TripField::Food => "What kind of food are you craving on this trip? Any dietary needs?",
        }
    }

    /// Best-effort validity contract handed to the model.
    ///
    /// Nothing in this crate enforces these; the model is instructed to keep
    /// asking until the answer satisfies them.
    pub fn expectation(&self) -> &'static str {
        match self {
            TripField::Destination => "a country, state or city",
            TripField::Departure => "a specific city, never just a country",
            TripField::TravelPeriod => "a whole number of days between 3 and 15",
            TripField::People => "a specific positive number of travelers",
            TripField::Budget => "a specific amount or range in USD",
            TripField::Accommodation => "specific preferences beyond vague words like nice or good",
            TripField::Activities => "a list of specific activities, not general terms like sightseeing",
            TripField::Food => "specific cuisine preferences or dietary requirements",
        }
    }

    /// Whether the field holds a set of items rather than one text value.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, TripField::Activities)
    }

    /// Scalar fields, in schema order.
    pub fn scalars() -> impl Iterator<Item = TripField> {
        Self::ALL.into_iter().filter(|f| !f.is_multi_valued())
    }
}

impl fmt::Display for TripField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TripField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TripField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ValidationError::invalid_format("field", format!("unknown field '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_eight_fields_in_collection_order() {
        let names: Vec<_> = TripField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "destination",
                "departure",
                "travel_period",
                "people",
                "budget",
                "accommodation",
                "activities",
                "food"
            ]
        );
    }

    #[test]
    fn only_activities_is_multi_valued() {
        let multi: Vec<_> = TripField::ALL.iter().filter(|f| f.is_multi_valued()).collect();
        assert_eq!(multi, vec![&TripField::Activities]);
        assert_eq!(TripField::scalars().count(), 7);
    }

    #[test]
    fn parses_every_field_name() {
        for field in TripField::ALL {
            assert_eq!(field.name().parse::<TripField>().unwrap(), field);
        }
    }

    #[test]
    fn rejects_unknown_field_name() {
        assert!("weather".parse::<TripField>().is_err());
    }

    #[test]
    fn serde_name_matches_wire_name() {
        let json = serde_json::to_string(&TripField::TravelPeriod).unwrap();
        assert_eq!(json, "\"travel_period\"");
    }

    #[test]
    fn every_field_has_question_and_expectation() {
        for field in TripField::ALL {
            assert!(!field.question().is_empty());
            assert!(!field.expectation().is_empty());
        }
    }
}
