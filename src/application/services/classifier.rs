//! Decides whether a turn on a complete record is an update.

use std::sync::Arc;

use crate::application::settings::ModelSettings;
use crate::domain::foundation::SessionId;
use crate::domain::trip::{classifier_prompt, parse_model_intent, Classification, KeywordScan, TripRecord};
use crate::ports::{AIProvider, CallPurpose, CompletionRequest, MessageRole, RequestMetadata};

/// Intent classifier backed by the model, with a keyword scan alongside.
#[derive(Clone)]
pub struct IntentClassifier {
    ai_provider: Arc<dyn AIProvider>,
    settings: ModelSettings,
    use_model: bool,
}

impl IntentClassifier {
    pub fn new(ai_provider: Arc<dyn AIProvider>, settings: ModelSettings, use_model: bool) -> Self {
        Self {
            ai_provider,
            settings,
            use_model,
        }
    }

    /// Classifies `utterance` against a complete `record`.
    ///
    /// Without the model, keywords decide. With it, the model's answer wins;
    /// a failed or unreadable answer defaults to a normal query.
    pub async fn classify(
        &self,
        session_id: &SessionId,
        utterance: &str,
        record: &TripRecord,
    ) -> Classification {
        if !self.use_model {
            return Classification::from_keywords(utterance);
        }

        let scan = KeywordScan::scan(utterance);
        let request = CompletionRequest::new(RequestMetadata::new(
            *session_id,
            CallPurpose::Classification,
            format!("classify-{}", session_id),
        ))
        .with_system_prompt(classifier_prompt(record))
        .with_message(MessageRole::User, utterance)
        .with_temperature(self.settings.classifier_temperature)
        .with_max_tokens(self.settings.classifier_max_tokens)
        .with_json_mode();

        let classification = match self.ai_provider.complete(request).await {
            Ok(response) => match parse_model_intent(&response.content) {
                Some(intent) => Classification::from_model(intent, scan),
                None => {
                    tracing::warn!(
                        session_id = %session_id,
                        "unreadable classifier answer, defaulting to normal query"
                    );
                    Classification::defaulted(scan)
                }
            },
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "classifier call failed");
                Classification::defaulted(scan)
            }
        };

        tracing::debug!(
            session_id = %session_id,
            intent = ?classification.intent,
            source = ?classification.source,
            "turn classified"
        );
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::domain::trip::{Intent, IntentSource, TripField};

    fn complete_record() -> TripRecord {
        let mut record = TripRecord::new();
        for field in TripField::scalars() {
            record.set_scalar(field, "x");
        }
        record.activities.insert("hiking".to_string());
        record
    }

    fn classifier(provider: &MockAIProvider, use_model: bool) -> IntentClassifier {
        IntentClassifier::new(Arc::new(provider.clone()), ModelSettings::default(), use_model)
    }

    #[tokio::test]
    async fn model_answer_decides_intent() {
        let provider = MockAIProvider::new().with_response_for(
            CallPurpose::Classification,
            r#"{"status": "update", "updated_status": "YES"}"#,
        );

        let result = classifier(&provider, true)
            .classify(&SessionId::new(), "make it 5 days instead", &complete_record())
            .await;

        assert_eq!(result.intent, Intent::Update);
        assert_eq!(result.source, IntentSource::Model);
        assert_eq!(provider.call_count_for(CallPurpose::Classification), 1);
    }

    #[tokio::test]
    async fn model_overrides_keyword_match() {
        let provider = MockAIProvider::new().with_response_for(
            CallPurpose::Classification,
            r#"{"status": "normal_query", "updated_status": "NO"}"#,
        );

        let result = classifier(&provider, true)
            .classify(&SessionId::new(), "what budget tips do you have?", &complete_record())
            .await;

        assert_eq!(result.intent, Intent::NormalQuery);
        assert!(result.scan.fields.contains(&TripField::Budget));
    }

    #[tokio::test]
    async fn provider_error_defaults_to_normal_query() {
        let provider = MockAIProvider::new()
            .with_error_for(CallPurpose::Classification, MockError::Network { message: "reset".into() });

        let result = classifier(&provider, true)
            .classify(&SessionId::new(), "change the hotel", &complete_record())
            .await;

        assert_eq!(result.intent, Intent::NormalQuery);
        assert_eq!(result.source, IntentSource::Default);
    }

    #[tokio::test]
    async fn unreadable_answer_defaults_to_normal_query() {
        let provider = MockAIProvider::new()
            .with_response_for(CallPurpose::Classification, "probably an update?");

        let result = classifier(&provider, true)
            .classify(&SessionId::new(), "change the hotel", &complete_record())
            .await;

        assert_eq!(result.source, IntentSource::Default);
    }

    #[tokio::test]
    async fn keywords_decide_when_model_disabled() {
        let provider = MockAIProvider::new();

        let result = classifier(&provider, false)
            .classify(&SessionId::new(), "change the hotel please", &complete_record())
            .await;

        assert_eq!(result.intent, Intent::Update);
        assert_eq!(result.source, IntentSource::Keywords);
        assert_eq!(provider.call_count(), 0);
    }
}
