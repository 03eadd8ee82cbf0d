//! The single outbound call a session makes
//!
//! [`AiGateway`] reduces a provider to `transcript + system prompt -> text`.
//! [`ProviderGateway`] backs it with a real [`ModelProvider`]; [`MockGateway`]
//! replays scripted replies for tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::GatewayError;
use tutor_models::providers::{ChatRequest, Message, ModelProvider};

/// Sends a conversation to a language model and returns the raw reply
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// One completion. No retries are attempted.
    async fn complete(&self, history: &[Message], system_prompt: &str)
    -> Result<String, GatewayError>;
}

/// [`AiGateway`] over any [`ModelProvider`]
pub struct ProviderGateway {
    provider: Arc<dyn ModelProvider>,
    model: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl ProviderGateway {
    /// Use the provider's default model
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        let model = provider.default_model().to_string();
        Self {
            provider,
            model,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[async_trait]
impl AiGateway for ProviderGateway {
    async fn complete(
        &self,
        history: &[Message],
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        let mut request =
            ChatRequest::new(self.model.clone(), history.to_vec()).system(system_prompt);
        if let Some(max_tokens) = self.max_tokens {
            request = request.max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            turns = history.len(),
            "sending completion request"
        );

        let response = self.provider.chat(request).await?;
        debug!(
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "completion received"
        );
        Ok(response.content)
    }
}

/// A request seen by [`MockGateway`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub history: Vec<Message>,
    pub system_prompt: String,
}

/// Scripted [`AiGateway`] for testing
///
/// Queue replies with [`queue_reply`](Self::queue_reply) before driving a
/// session. Each `complete()` consumes one queued entry; an empty queue is a
/// transport failure.
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next call
    pub fn queue_reply(&self, text: impl Into<String>) {
        self.lock_replies().push_back(Ok(text.into()));
    }

    /// Queue a failure for the next call
    pub fn queue_error(&self, error: GatewayError) {
        self.lock_replies().push_back(Err(error));
    }

    /// Number of replies not yet consumed
    pub fn queued_reply_count(&self) -> usize {
        self.lock_replies().len()
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, GatewayError>>> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AiGateway for MockGateway {
    async fn complete(
        &self,
        history: &[Message],
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                history: history.to_vec(),
                system_prompt: system_prompt.to_string(),
            });

        self.lock_replies()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("no queued reply".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_models::providers::{ChatResponse, StopReason, Usage};

    struct FixedProvider {
        reply: Result<String, u16>,
        seen: Mutex<Option<ChatRequest>>,
    }

    #[async_trait]
    impl ModelProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn default_model(&self) -> &str {
            "fixed-1"
        }

        async fn chat(&self, request: ChatRequest) -> tutor_models::Result<ChatResponse> {
            *self.seen.lock().unwrap() = Some(request);
            match &self.reply {
                Ok(text) => Ok(ChatResponse {
                    content: text.clone(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::new(10, 5),
                }),
                Err(401) => Err(tutor_models::Error::InvalidApiKey),
                Err(status) => Err(tutor_models::Error::Http {
                    status: *status,
                    message: "rate limited".into(),
                }),
            }
        }
    }

    fn provider(reply: Result<String, u16>) -> Arc<FixedProvider> {
        Arc::new(FixedProvider {
            reply,
            seen: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn provider_gateway_builds_request() {
        let provider = provider(Ok("Which planet is largest?".into()));
        let gateway = ProviderGateway::new(provider.clone())
            .with_max_tokens(512)
            .with_temperature(0.4);

        let reply = gateway
            .complete(&[Message::user("hi")], "be kind")
            .await
            .unwrap();
        assert_eq!(reply, "Which planet is largest?");

        let seen = provider.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.model, "fixed-1");
        assert_eq!(seen.system.as_deref(), Some("be kind"));
        assert_eq!(seen.max_tokens, Some(512));
        assert_eq!(seen.temperature, Some(0.4));
        assert_eq!(seen.messages, vec![Message::user("hi")]);
    }

    #[tokio::test]
    async fn provider_errors_are_classified() {
        let gateway = ProviderGateway::new(provider(Err(401)));
        let err = gateway.complete(&[], "").await.unwrap_err();
        assert!(err.is_credential());

        let gateway = ProviderGateway::new(provider(Err(429)));
        let err = gateway.complete(&[], "").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Upstream {
                status: 429,
                message: "rate limited".into()
            }
        );
    }

    #[tokio::test]
    async fn model_override_is_used() {
        let gateway = ProviderGateway::new(provider(Ok("ok".into()))).with_model("other");
        assert_eq!(gateway.model(), "other");
        assert_eq!(gateway.provider_name(), "fixed");
    }

    #[tokio::test]
    async fn mock_replays_in_order_and_records_requests() {
        let mock = MockGateway::new();
        mock.queue_reply("first");
        mock.queue_error(GatewayError::Transport("down".into()));
        assert_eq!(mock.queued_reply_count(), 2);

        assert_eq!(mock.complete(&[], "sys-1").await.unwrap(), "first");
        assert!(mock.complete(&[Message::user("x")], "sys-2").await.is_err());

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].system_prompt, "sys-2");
        assert_eq!(requests[1].history, vec![Message::user("x")]);
    }

    #[tokio::test]
    async fn empty_mock_is_transport_failure() {
        let err = MockGateway::new().complete(&[], "").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
