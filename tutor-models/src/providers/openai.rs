//! OpenAI chat-completions provider.
//!
//! The system instruction is sent as the first message and the reply text is
//! read from `choices[0].message.content`. Any API speaking the same shape
//! (Azure deployments, local gateways) works through `with_base_url`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatRequest, ChatResponse, ModelProvider, StopReason, Usage, status_error};
use crate::auth::ApiKey;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct CompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn parse_response(body: &str) -> Result<ChatResponse> {
    let parsed: CompletionsResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("invalid completions body: {e}")))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("missing choices[0]".to_string()))?;

    let stop_reason = StopReason::from_provider(choice.finish_reason.as_deref());
    let text = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| Error::MalformedResponse("missing choices[0].message.content".to_string()))?;

    let usage = parsed
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(ChatResponse {
        content: text,
        stop_reason,
        usage,
    })
}

/// Provider for OpenAI-compatible chat-completions endpoints.
pub struct OpenAiProvider {
    base_url: String,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: ApiKey) -> Self {
        Self::with_client(api_key, reqwest::Client::new())
    }

    pub fn with_client(api_key: ApiKey, client: reqwest::Client) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            client,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

fn wire_messages(request: &ChatRequest) -> Vec<WireMessage<'_>> {
    let system = request.system.as_deref().map(|s| WireMessage {
        role: "system",
        content: s,
    });
    system
        .into_iter()
        .chain(request.messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }))
        .collect()
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.api_key.is_blank() {
            return Err(Error::CredentialsNotFound(self.name().to_string()));
        }

        let body = CompletionsRequest {
            model: &request.model,
            messages: wire_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %request.model, turns = request.messages.len(), "sending chat completion");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Message;

    #[test]
    fn parse_response_extracts_first_choice() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Which planet is closest to the Sun?"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 80, "completion_tokens": 10, "total_tokens": 90}
        }"#;

        let response = parse_response(json).unwrap();
        assert_eq!(response.content, "Which planet is closest to the Sun?");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total_tokens, 90);
    }

    #[test]
    fn null_content_is_malformed() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(matches!(parse_response(json), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn empty_choices_is_malformed() {
        assert!(matches!(
            parse_response(r#"{"choices": []}"#),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn system_prompt_is_sent_first() {
        let request = ChatRequest::new(
            DEFAULT_MODEL,
            vec![Message::assistant("Q1?"), Message::user("A1")],
        )
        .system("tutor rules");
        let wire = wire_messages(&request);
        let roles: Vec<_> = wire.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "assistant", "user"]);
        assert_eq!(wire[0].content, "tutor rules");
    }

    #[test]
    fn endpoint_uses_custom_base_url() {
        let provider = OpenAiProvider::new(ApiKey::new("k")).with_base_url("http://localhost:8080/");
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
