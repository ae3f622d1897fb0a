//! Tunables for model calls and turn processing.

use crate::domain::trip::{RegenerationPolicy, WELCOME_MESSAGE};

/// Sampling parameters for each kind of model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub reply_temperature: f32,
    pub extraction_temperature: f32,
    pub classifier_temperature: f32,
    pub classifier_max_tokens: u32,
    pub itinerary_temperature: f32,
    pub itinerary_max_tokens: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            reply_temperature: 0.5,
            extraction_temperature: 0.3,
            classifier_temperature: 0.0,
            classifier_max_tokens: 50,
            itinerary_temperature: 0.3,
            itinerary_max_tokens: 4000,
        }
    }
}

/// Conversation behaviour switches.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSettings {
    /// When a complete record regenerates its itinerary.
    pub regeneration: RegenerationPolicy,
    /// Consult the model classifier once a record is complete.
    pub model_classifier: bool,
    /// First assistant message of a connected session.
    pub welcome_message: String,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            regeneration: RegenerationPolicy::default(),
            model_classifier: true,
            welcome_message: WELCOME_MESSAGE.to_string(),
        }
    }
}
