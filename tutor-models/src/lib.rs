//! Model access for tutor.
//!
//! This crate provides:
//! - Credential management for API keys ([`auth::CredentialStore`])
//! - A provider trait with Anthropic and OpenAI adapters ([`providers`])
//! - A PDF text extraction client for the curriculum admin tool ([`ocr`])
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              dyn ModelProvider                       │
//! │  ┌──────────────────────┐  ┌──────────────────────┐ │
//! │  │  AnthropicProvider   │  │    OpenAiProvider    │ │
//! │  │  (messages API)      │  │  (chat completions)  │ │
//! │  └──────────────────────┘  └──────────────────────┘ │
//! └─────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                  CredentialStore                     │
//! │         (System Keyring + Env Fallback)             │
//! └─────────────────────────────────────────────────────┘
//! ```

mod error;

pub mod auth;
pub mod ocr;
pub mod providers;

pub use error::{Error, Result};
