//! Anthropic messages API provider.
//!
//! The system instruction goes in the top-level `system` field and the reply
//! text is read from `content[0].text`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatRequest, ChatResponse, ModelProvider, Role, StopReason, Usage, status_error};
use crate::auth::ApiKey;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The messages API requires `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Pull the reply out of a success body.
fn parse_response(body: &str) -> Result<ChatResponse> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("invalid messages body: {e}")))?;

    let text = parsed
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| Error::MalformedResponse("missing content[0].text".to_string()))?;

    let usage = parsed
        .usage
        .map(|u| Usage::new(u.input_tokens, u.output_tokens))
        .unwrap_or_default();

    Ok(ChatResponse {
        content: text,
        stop_reason: StopReason::from_provider(parsed.stop_reason.as_deref()),
        usage,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// AnthropicProvider
// ────────────────────────────────────────────────────────────────────────────

/// Provider for Claude models over the messages API.
pub struct AnthropicProvider {
    base_url: String,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl AnthropicProvider {
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        if self.api_key.is_blank() {
            return Err(Error::CredentialsNotFound(self.name().to_string()));
        }

        // The messages API has no system role inside the transcript.
        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.as_deref(),
            messages,
            temperature: request.temperature,
        };

        debug!(model = %request.model, turns = request.messages.len(), "sending messages request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
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
