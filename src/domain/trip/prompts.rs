//! Prompt text sent to the language model.

use super::intent::KeywordScan;
use super::record::TripRecord;
use super::schema::TripField;
use crate::domain::session::{Turn, TurnRole};

/// First assistant message of every conversation.
pub const WELCOME_MESSAGE: &str = "Hi, welcome to your personal trip planner! \
We're here to help you build the perfect itinerary based on what you love. \
We'll ask about your destination, where you're starting from, how long you'll travel, \
who's coming, your budget, where you'd like to stay, what you want to do and what you like to eat. \
So, where would you like to go?";

/// Reply used when the model cannot be reached.
pub const APOLOGY_MESSAGE: &str =
    "I'm having trouble processing your request right now. Please try again in a moment.";

/// Reply once every field has been collected.
pub const ALL_COLLECTED_MESSAGE: &str =
    "Thanks, I have everything I need! Putting your itinerary together now.";

/// Assistant text to use when the model supplied none: the next missing
/// field's question, or the completion notice.
pub fn next_question(record: &TripRecord) -> &'static str {
    record
        .missing_fields()
        .first()
        .map(TripField::question)
        .unwrap_or(ALL_COLLECTED_MESSAGE)
}

/// Renders the transcript as `User:`/`Assistant:` lines.
pub fn format_transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                TurnRole::User => "User",
                TurnRole::Assistant => "Assistant",
            };
            format!("{}: {}", speaker, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn schema_block() -> String {
    TripField::ALL
        .iter()
        .map(|f| format!("- \"{}\": ask \"{}\" (expect {})", f.name(), f.question(), f.expectation()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn record_json(record: &TripRecord) -> String {
    serde_json::to_string_pretty(&record.to_json()).unwrap_or_else(|_| "{}".to_string())
}

fn shared_instructions(history: &[Turn], record: &TripRecord) -> String {
    format!(
        "You are a friendly travel assistant collecting trip details one question at a time.\n\
         Required fields, in order:\n{schema}\n\n\
         Rules:\n\
         - Ask only one follow-up question at a time, for the next missing or unclear field.\n\
         - Do not accept vague answers; keep asking until the value meets its expectation.\n\
         - If the travel period is outside 3 to 15 days, explain the limit and ask again; \
           do not record it.\n\
         - Only recommend safe, accessible destinations.\n\n\
         Details collected so far:\n{record}\n\n\
         Conversation so far:\n{transcript}",
        schema = schema_block(),
        record = record_json(record),
        transcript = format_transcript(history),
    )
}

/// System prompt for the structured extraction call.
pub fn extraction_prompt(history: &[Turn], record: &TripRecord, update: Option<&KeywordScan>) -> String {
    let mut prompt = shared_instructions(history, record);
    prompt.push_str(
        "\n\nRespond with valid JSON only, in this shape:\n\
         {\"response\": \"<your reply to the user>\", \
         \"extracted_data\": {\"<field>\": \"<value>\", \"activities\": [\"<item>\"]}}\n\
         Include in extracted_data only fields the user has stated clearly.",
    );
    if let Some(scan) = update {
        prompt.push_str(&update_instruction(record, scan));
    }
    prompt
}

/// System prompt for the streamed, text-only reply.
pub fn reply_prompt(history: &[Turn], record: &TripRecord) -> String {
    let mut prompt = shared_instructions(history, record);
    prompt.push_str("\n\nReply to the user in plain conversational text. Do not output JSON.");
    prompt
}

/// Extra instruction marking the turn as a correction of confirmed fields.
pub fn update_instruction(record: &TripRecord, scan: &KeywordScan) -> String {
    let mut text = format!(
        "\n\nThe user is updating details they already confirmed, not adding a new field.\n\
         Current data: {}\n\
         Extract ONLY the fields being updated.",
        record_json(record)
    );
    if !scan.fields.is_empty() {
        let names: Vec<_> = scan.fields.iter().map(TripField::name).collect();
        text.push_str(&format!(" Likely fields: {}.", names.join(", ")));
    }
    text
}

/// System prompt for the update classifier.
pub fn classifier_prompt(record: &TripRecord) -> String {
    format!(
        "All trip details have been collected:\n{}\n\n\
         Decide whether the user's next message changes any of these details.\n\
         Respond with JSON only: {{\"status\": \"update\" or \"normal_query\", \
         \"updated_status\": \"YES\" or \"NO\"}}",
        record_json(record)
    )
}
