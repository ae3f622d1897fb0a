//! Merging a turn's candidate fields into the accumulated trip record.
//!
//! `merge` is pure: no I/O, no hidden state. Callers persist the outcome.

use serde::Serialize;

use super::keywords::has_addition_keyword;
use super::record::TripRecord;
use super::schema::TripField;

/// Largest update-tagged activity list that may be read as a replacement.
pub const SHORT_LIST_MAX: usize = 2;

/// How the incoming activity set combines with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityMerge {
    Union,
    Replace,
}

/// Picks the activity policy for one merge.
///
/// Short update-tagged lists are ambiguous between "add this" and "only
/// this"; the addition keywords in the raw utterance decide.
pub fn activity_policy(is_update: bool, incoming: usize, raw_utterance: &str) -> ActivityMerge {
    if !is_update || incoming > SHORT_LIST_MAX {
        return ActivityMerge::Union;
    }
    if has_addition_keyword(raw_utterance) {
        ActivityMerge::Union
    } else {
        ActivityMerge::Replace
    }
}

/// Result of reconciling one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub record: TripRecord,
    pub missing_fields: Vec<TripField>,
    pub complete: bool,
}

impl MergeOutcome {
    /// Builds the outcome for a record as it stands.
    pub fn of(record: TripRecord) -> Self {
        let missing_fields = record.missing_fields();
        let complete = missing_fields.is_empty();
        Self {
            record,
            missing_fields,
            complete,
        }
    }
}

/// Merges `candidate` into `current`.
///
/// Scalars are last-write-wins whenever the candidate carries a non-empty
/// value. Activities follow [`activity_policy`]. Keys outside the schema are
/// copied into `extras`.
pub fn merge(
    current: &TripRecord,
    candidate: &TripRecord,
    is_update: bool,
    raw_utterance: &str,
) -> MergeOutcome {
    let mut record = current.clone();

    for field in TripField::scalars() {
        if let Some(value) = candidate.scalar(field) {
            record.set_scalar(field, value);
        }
    }

    if !candidate.activities.is_empty() {
        match activity_policy(is_update, candidate.activities.len(), raw_utterance) {
            ActivityMerge::Union => {
                record
                    .activities
                    .extend(candidate.activities.iter().cloned());
            }
            ActivityMerge::Replace => {
                record.activities = candidate.activities.clone();
            }
        }
    }

    for (key, value) in &candidate.extras {
        record.extras.insert(key.clone(), value.clone());
    }

    MergeOutcome::of(record)
}
