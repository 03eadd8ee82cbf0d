//! Error types for tutor-core

use thiserror::Error;

/// Top-level error type for tutor-core
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Failures of a single call through the AI gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No usable API key, or the provider rejected it. The user must fix setup.
    #[error("No usable credential: {0}")]
    Credential(String),

    /// Non-success status from the provider (rate limit, overload, server error).
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request never produced a response.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Success status, but the reply text was missing.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    pub fn is_credential(&self) -> bool {
        matches!(self, GatewayError::Credential(_))
    }
}

impl From<tutor_models::Error> for GatewayError {
    fn from(err: tutor_models::Error) -> Self {
        use tutor_models::Error as E;
        match err {
            E::CredentialsNotFound(provider) => {
                GatewayError::Credential(format!("no API key configured for {provider}"))
            }
            E::InvalidApiKey => GatewayError::Credential("API key was rejected".to_string()),
            E::Keyring(msg) => GatewayError::Credential(format!("keyring unavailable: {msg}")),
            E::ProviderNotFound(name) => {
                GatewayError::Credential(format!("unknown provider: {name}"))
            }
            E::Http { status, message } => GatewayError::Upstream { status, message },
            E::Request(msg) => GatewayError::Transport(msg),
            E::Io(e) => GatewayError::Transport(e.to_string()),
            E::MalformedResponse(msg) => GatewayError::MalformedResponse(msg),
            E::Serialization(e) => GatewayError::MalformedResponse(e.to_string()),
        }
    }
}

/// Errors related to driving a tutoring session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid phase: expected {expected}, got {actual}")]
    InvalidPhase { expected: String, actual: String },

    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("A turn is already waiting for the tutor's reply")]
    TurnInProgress,

    #[error("Answer is empty")]
    EmptyInput,

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Errors from the local JSON stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No entry matches '{0}'")]
    NotFound(String),

    #[error("'{0}' matches more than one entry")]
    Ambiguous(String),
}
