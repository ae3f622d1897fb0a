//! Conversation behaviour configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::ConversationSettings;
use crate::domain::trip::RegenerationPolicy;

/// Conversation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// When a complete record regenerates its itinerary
    #[serde(default)]
    pub regeneration: RegenerationPolicy,

    /// Consult the model to classify turns on a complete record
    #[serde(default = "default_model_classifier")]
    pub model_classifier: bool,

    /// Replaces the built-in welcome text
    pub welcome_message: Option<String>,
}

impl ConversationConfig {
    pub fn settings(&self) -> ConversationSettings {
        let defaults = ConversationSettings::default();
        ConversationSettings {
            regeneration: self.regeneration,
            model_classifier: self.model_classifier,
            welcome_message: self
                .welcome_message
                .clone()
                .unwrap_or(defaults.welcome_message),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.welcome_message {
            Some(message) if message.trim().is_empty() => {
                Err(ValidationError::BlankWelcomeMessage)
            }
            _ => Ok(()),
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            regeneration: RegenerationPolicy::default(),
            model_classifier: default_model_classifier(),
            welcome_message: None,
        }
    }
}

fn default_model_classifier() -> bool {
    true
}
