//! Language model configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::ModelSettings;

/// Language model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,

    #[serde(default = "default_extraction_temperature")]
    pub extraction_temperature: f32,

    #[serde(default)]
    pub classifier_temperature: f32,

    #[serde(default = "default_itinerary_temperature")]
    pub itinerary_temperature: f32,

    #[serde(default = "default_classifier_max_tokens")]
    pub classifier_max_tokens: u32,

    #[serde(default = "default_itinerary_max_tokens")]
    pub itinerary_max_tokens: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an OpenAI key is present and non-blank
    pub fn has_openai(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Sampling parameters handed to the conversation services.
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            reply_temperature: self.reply_temperature,
            extraction_temperature: self.extraction_temperature,
            classifier_temperature: self.classifier_temperature,
            classifier_max_tokens: self.classifier_max_tokens,
            itinerary_temperature: self.itinerary_temperature,
            itinerary_max_tokens: self.itinerary_max_tokens,
        }
    }

    /// Validate model configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() {
            return Err(ValidationError::MissingRequired("TRIP_PLANNER__AI__OPENAI_API_KEY"));
        }

        let temperatures = [
            ("reply", self.reply_temperature),
            ("extraction", self.extraction_temperature),
            ("classifier", self.classifier_temperature),
            ("itinerary", self.itinerary_temperature),
        ];
        for (name, value) in temperatures {
            if !(0.0..=2.0).contains(&value) {
                return Err(ValidationError::InvalidTemperature(name));
            }
        }

        if self.classifier_max_tokens == 0 {
            return Err(ValidationError::InvalidTokenLimit("classifier"));
        }
        if self.itinerary_max_tokens == 0 {
            return Err(ValidationError::InvalidTokenLimit("itinerary"));
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        let models = ModelSettings::default();
        Self {
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            reply_temperature: models.reply_temperature,
            extraction_temperature: models.extraction_temperature,
            classifier_temperature: models.classifier_temperature,
            itinerary_temperature: models.itinerary_temperature,
            classifier_max_tokens: models.classifier_max_tokens,
            itinerary_max_tokens: models.itinerary_max_tokens,
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}

fn default_reply_temperature() -> f32 {
    ModelSettings::default().reply_temperature
}

fn default_extraction_temperature() -> f32 {
    ModelSettings::default().extraction_temperature
}

fn default_itinerary_temperature() -> f32 {
    ModelSettings::default().itinerary_temperature
}

fn default_classifier_max_tokens() -> u32 {
    ModelSettings::default().classifier_max_tokens
}

fn default_itinerary_max_tokens() -> u32 {
    ModelSettings::default().itinerary_max_tokens
}
