//! Trip slot-filling domain.
//!
//! - `schema` - the eight required fields and their questions
//! - `record` - the accumulated field values
//! - `reconcile` - pure merge of a turn's candidate into the record
//! - `intent` - update versus normal query classification
//! - `model_reply` - staged parsing of structured model output
//! - `itinerary` - generation preconditions and regeneration policy
//! - `prompts` - text sent to the model

mod intent;
mod itinerary;
mod keywords;
mod model_reply;
mod prompts;
mod reconcile;
mod record;
mod schema;

pub use intent::{parse_model_intent, Classification, Intent, IntentSource, KeywordScan};
pub use itinerary::{
    render_itinerary_prompt, should_generate, GenerationError, Itinerary, RegenerationPolicy,
};
pub use keywords::{
    field_keywords, has_addition_keyword, ADDITION_KEYWORDS, UPDATE_KEYWORDS,
};
pub use model_reply::{ModelReply, ParseStage, StructuredReply};
pub use prompts::{
    classifier_prompt, extraction_prompt, format_transcript, next_question, reply_prompt,
    update_instruction, ALL_COLLECTED_MESSAGE, APOLOGY_MESSAGE, WELCOME_MESSAGE,
};
pub use reconcile::{activity_policy, merge, ActivityMerge, MergeOutcome, SHORT_LIST_MAX};
pub use record::TripRecord;
pub use schema::{TripField, MAX_TRAVEL_DAYS, MIN_TRAVEL_DAYS};
