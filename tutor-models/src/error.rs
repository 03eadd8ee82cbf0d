//! Error types for model access.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a model or OCR provider.
#[derive(Debug, Error)]
pub enum Error {
    /// Provider name not recognised.
    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Failed to access system keyring.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// The provider rejected the API key.
    #[error("invalid API key")]
    InvalidApiKey,

    /// Provider returned a non-success status.
    #[error("provider returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// Success response without the expected text field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the caller has no usable credential: the key
    /// is missing or rejected, the keyring can't be read, or the provider
    /// name doesn't resolve to anything a key could be stored under.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            Error::CredentialsNotFound(_)
                | Error::InvalidApiKey
                | Error::Keyring(_)
                | Error::ProviderNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = Error::Http {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned 429: rate limited");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn credential_errors_are_classified() {
        assert!(Error::InvalidApiKey.is_credential());
        assert!(Error::CredentialsNotFound("openai".into()).is_credential());
        assert!(Error::Keyring("locked".into()).is_credential());
        assert!(Error::ProviderNotFound("gemini".into()).is_credential());
        assert!(!Error::Request("timeout".into()).is_credential());
        assert!(!Error::MalformedResponse("no text".into()).is_credential());
    }
}
