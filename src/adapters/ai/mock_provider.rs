//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses, optionally per [`CallPurpose`]
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! A turn issues several calls (reply, extraction, classification,
//! itinerary). Responses queued with `with_response_for` are consumed only
//! by calls of that purpose; `with_response` feeds a shared queue used when
//! the purpose queue is empty.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response_for(CallPurpose::Extraction, r#"{"response": "Hi", "extracted_data": {}}"#)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CallPurpose, ChunkStream, CompletionRequest, CompletionResponse,
    FinishReason, ProviderInfo, StreamChunk, TokenUsage,
};

/// Content returned once every queue is exhausted.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Responses for any purpose (consumed in order).
    shared: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Responses reserved for one purpose (consumed in order).
    by_purpose: Arc<Mutex<HashMap<CallPurpose, VecDeque<MockResponse>>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success {
        content: String,
        finish_reason: FinishReason,
    },
    /// Return an error.
    Error(MockError),
    /// Stream `partial` and then fail; non-streaming calls just fail.
    Interrupted { partial: String, error: MockError },
}

impl MockResponse {
    /// Successful completion ending with `Stop`.
    pub fn success(content: impl Into<String>) -> Self {
        MockResponse::Success {
            content: content.into(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(VecDeque::new())),
            by_purpose: Arc::new(Mutex::new(HashMap::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the shared queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.shared).push_back(MockResponse::success(content));
        self
    }

    /// Adds an error to the shared queue.
    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.shared).push_back(MockResponse::Error(error));
        self
    }

    /// Adds a successful response for calls of one purpose.
    pub fn with_response_for(self, purpose: CallPurpose, content: impl Into<String>) -> Self {
        self.push_for(purpose, MockResponse::success(content));
        self
    }

    /// Adds an error for calls of one purpose.
    pub fn with_error_for(self, purpose: CallPurpose, error: MockError) -> Self {
        self.push_for(purpose, MockResponse::Error(error));
        self
    }

    /// Adds a stream for one purpose that fails after sending `partial`.
    pub fn with_interrupted_stream_for(
        self,
        purpose: CallPurpose,
        partial: impl Into<String>,
        error: MockError,
    ) -> Self {
        self.push_for(
            purpose,
            MockResponse::Interrupted {
                partial: partial.into(),
                error,
            },
        );
        self
    }

    /// Queues a response for one purpose on an already shared provider.
    pub fn push_for(&self, purpose: CallPurpose, response: MockResponse) {
        lock(&self.by_purpose)
            .entry(purpose)
            .or_default()
            .push_back(response);
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns the number of calls made for one purpose.
    pub fn call_count_for(&self, purpose: CallPurpose) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.metadata.purpose == purpose)
            .count()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    /// Returns recorded calls for one purpose.
    pub fn calls_for(&self, purpose: CallPurpose) -> Vec<CompletionRequest> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.metadata.purpose == purpose)
            .cloned()
            .collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Gets the next response or a default.
    fn next_response(&self, purpose: CallPurpose) -> MockResponse {
        let reserved = lock(&self.by_purpose)
            .get_mut(&purpose)
            .and_then(VecDeque::pop_front);
        reserved
            .or_else(|| lock(&self.shared).pop_front())
            .unwrap_or_else(|| MockResponse::success(DEFAULT_MOCK_RESPONSE))
    }

    fn record(&self, request: &CompletionRequest) {
        lock(&self.calls).push(request.clone());
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        self.record(&request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response(request.metadata.purpose) {
            MockResponse::Success {
                content,
                finish_reason,
            } => Ok(CompletionResponse {
                usage: TokenUsage::new(10, (content.len() / 4) as u32),
                content,
                model: self.info.model.clone(),
                finish_reason,
            }),
            MockResponse::Error(err) | MockResponse::Interrupted { error: err, .. } => {
                Err(err.into())
            }
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        self.record(&request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let delay = self.delay;
        match self.next_response(request.metadata.purpose) {
            MockResponse::Success {
                content,
                finish_reason,
            } => {
                // Line-preserving word chunks so concatenation equals the input.
                let pieces: Vec<Result<StreamChunk, AIError>> = content
                    .split_inclusive(char::is_whitespace)
                    .map(|s| Ok(StreamChunk::content(s)))
                    .collect();

                let final_chunk = stream::once(async move {
                    if !delay.is_zero() {
                        sleep(delay / 10).await;
                    }
                    Ok(StreamChunk::final_chunk(finish_reason))
                });

                Ok(Box::pin(stream::iter(pieces).chain(final_chunk)))
            }
            MockResponse::Interrupted { partial, error } => {
                let mut pieces: Vec<Result<StreamChunk, AIError>> = partial
                    .split_inclusive(char::is_whitespace)
                    .map(|s| Ok(StreamChunk::content(s)))
                    .collect();
                pieces.push(Err(error.into()));
                Ok(Box::pin(stream::iter(pieces)))
            }
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{MessageRole, RequestMetadata};

    fn test_request(purpose: CallPurpose) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), purpose, "trace-123"))
            .with_message(MessageRole::User, "Hello")
    }

    #[tokio::test]
    async fn mock_provider_returns_responses_in_order() {
        let provider = MockAIProvider::new().with_response("First").with_response("Second");

        let r1 = provider.complete(test_request(CallPurpose::Reply)).await.unwrap();
        let r2 = provider.complete(test_request(CallPurpose::Reply)).await.unwrap();
        let r3 = provider.complete(test_request(CallPurpose::Reply)).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, "Second");
        assert_eq!(r3.content, DEFAULT_MOCK_RESPONSE);
        assert_eq!(r1.model, "mock-model-1");
    }

    #[tokio::test]
    async fn purpose_queue_takes_precedence_over_shared() {
        let provider = MockAIProvider::new()
            .with_response("shared")
            .with_response_for(CallPurpose::Extraction, "extraction only");

        let reply = provider.complete(test_request(CallPurpose::Reply)).await.unwrap();
        let extraction = provider
            .complete(test_request(CallPurpose::Extraction))
            .await
            .unwrap();

        assert_eq!(reply.content, "shared");
        assert_eq!(extraction.content, "extraction only");
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_error() {
        let provider = MockAIProvider::new()
            .with_error_for(CallPurpose::Classification, MockError::RateLimited { retry_after_secs: 30 });

        let err = provider
            .complete(test_request(CallPurpose::Classification))
            .await
            .unwrap_err();

        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn mock_provider_tracks_calls_by_purpose() {
        let provider = MockAIProvider::new();

        provider.complete(test_request(CallPurpose::Extraction)).await.unwrap();
        provider.complete(test_request(CallPurpose::Itinerary)).await.unwrap();
        provider.complete(test_request(CallPurpose::Itinerary)).await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.call_count_for(CallPurpose::Itinerary), 2);
        assert_eq!(provider.calls_for(CallPurpose::Extraction).len(), 1);

        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn streaming_chunks_concatenate_to_content() {
        let provider = MockAIProvider::new().with_response("Day 1\nBeach day\n\nDay 2 Hike");

        let mut stream = provider
            .stream_complete(test_request(CallPurpose::Itinerary))
            .await
            .unwrap();

        let mut content = String::new();
        let mut saw_final = false;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            if chunk.is_final() {
                saw_final = true;
            } else {
                content.push_str(&chunk.delta);
            }
        }

        assert_eq!(content, "Day 1\nBeach day\n\nDay 2 Hike");
        assert!(saw_final);
    }

    #[tokio::test]
    async fn streaming_returns_error() {
        let provider = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "Service down".to_string(),
        });

        let result = provider.stream_complete(test_request(CallPurpose::Reply)).await;

        assert!(matches!(result, Err(AIError::Unavailable { .. })));
    }
}
