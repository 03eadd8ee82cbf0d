//! Model provider trait and implementations.
//!
//! The [`ModelProvider`] trait is the single seam between tutor and a hosted
//! language model. Two request shapes are supported:
//!
//! - [`AnthropicProvider`]: the messages API, reply at `content[0].text`
//! - [`OpenAiProvider`]: the chat-completions API, reply at
//!   `choices[0].message.content`
//!
//! # Example
//!
//! ```ignore
//! use tutor_models::providers::{ChatRequest, Message, ModelProvider};
//!
//! async fn chat(provider: &dyn ModelProvider) -> tutor_models::Result<String> {
//!     let request = ChatRequest::new(provider.default_model(), vec![Message::user("Hello!")])
//!         .system("You are a patient tutor.");
//!     Ok(provider.chat(request).await?.content)
//! }
//! ```

mod anthropic;
mod openai;
mod types;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use types::*;

use crate::auth::CredentialStore;
use crate::{Error, Result};

/// Trait for hosted chat model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider identifier, also the credential store key.
    fn name(&self) -> &str;

    /// Model used when the configuration does not name one.
    fn default_model(&self) -> &str;

    /// Perform a non-streaming chat completion.
    ///
    /// # Errors
    ///
    /// - `Error::CredentialsNotFound` / `Error::InvalidApiKey` when no usable key is configured
    ///   or the provider rejects it
    /// - `Error::Http` for any other non-success status
    /// - `Error::Request` when the request could not be sent
    /// - `Error::MalformedResponse` when the body lacks the reply text
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Supported provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "gpt" => Ok(ProviderKind::OpenAi),
            other => Err(Error::ProviderNotFound(other.to_string())),
        }
    }
}

/// Connection settings shared by both adapters.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// Override the API base URL (proxies, self-hosted gateways).
    pub base_url: Option<String>,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Option<Duration>,
}

/// Build a provider, resolving its API key from the credential store.
///
/// Fails with `Error::CredentialsNotFound` when the key is missing, so the
/// caller can refuse to start a session before any request is made.
pub fn connect(
    kind: ProviderKind,
    credentials: &CredentialStore,
    settings: &ProviderSettings,
) -> Result<Arc<dyn ModelProvider>> {
    let key = credentials.get(kind.as_str())?;
    let client = http_client(settings.timeout)?;

    let provider: Arc<dyn ModelProvider> = match kind {
        ProviderKind::Anthropic => {
            let mut p = AnthropicProvider::with_client(key, client);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderKind::OpenAi => {
            let mut p = OpenAiProvider::with_client(key, client);
            if let Some(url) = &settings.base_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
    };
    Ok(provider)
}

pub(crate) fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| Error::Request(e.to_string()))
}

/// Error body shape used by both Anthropic and OpenAI.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Map a non-success status and its body to a crate error.
///
/// 401/403 mean the key was rejected; everything else keeps its status.
pub(crate) fn status_error(status: u16, body: &str) -> Error {
    if status == 401 || status == 403 {
        return Error::InvalidApiKey;
    }
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        });
    Error::Http { status, message }
}
