//! Credential management for provider API keys.
//!
//! Keys live in the system keyring under the `tutor` service. For CI and
//! classroom machines without a keyring, the store can fall back to the
//! provider's conventional environment variable.
//!
//! # Example
//!
//! ```ignore
//! use tutor_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new("tutor").with_env_fallback();
//! store.set("anthropic", "sk-ant-...")?;
//! let key = store.get("anthropic")?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// Keyring service name used by the CLI.
pub const SERVICE_NAME: &str = "tutor";

/// An API key that never shows up in logs.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Expose the secret key value.
    ///
    /// Only call this when building the outgoing request.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    /// A key made only of whitespace is treated as missing.
    pub fn is_blank(&self) -> bool {
        self.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey([REDACTED])")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Environment variable names for each provider.
const ENV_VARS: &[(&str, &str)] = &[
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("mistral", "MISTRAL_API_KEY"),
];

/// Providers the store knows how to look up.
pub fn known_providers() -> impl Iterator<Item = &'static str> {
    ENV_VARS.iter().map(|(p, _)| *p)
}

/// Conventional environment variable holding `provider`'s key.
pub fn env_var_for_provider(provider: &str) -> Option<&'static str> {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, v)| *v)
}

/// Credential storage backed by the system keyring.
///
/// Lookups check the keyring first, then the environment when
/// `env_fallback` is enabled. Writes always go to the keyring.
pub struct CredentialStore {
    service_name: String,
    env_fallback: bool,
}

impl CredentialStore {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Also consult `ANTHROPIC_API_KEY` and friends when the keyring is empty.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get a usable API key for a provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if neither source has a key and
    /// `Error::InvalidApiKey` if the stored key is blank.
    pub fn get(&self, provider: &str) -> Result<ApiKey> {
        let key = if let Some(key) = self.get_from_keyring(provider) {
            debug!(provider, "retrieved API key from keyring");
            key
        } else if self.env_fallback
            && let Some(key) = self.get_from_env(provider)
        {
            debug!(provider, "retrieved API key from environment");
            key
        } else {
            return Err(Error::CredentialsNotFound(provider.to_string()));
        };

        if key.is_blank() {
            return Err(Error::InvalidApiKey);
        }
        Ok(key)
    }

    /// Store an API key in the system keyring.
    pub fn set(&self, provider: &str, key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::InvalidApiKey);
        }
        let entry = self.keyring_entry(provider)?;
        entry
            .set_password(key.trim())
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(provider, "stored API key in keyring");
        Ok(())
    }

    /// Delete an API key from the system keyring.
    pub fn delete(&self, provider: &str) -> Result<()> {
        let entry = self.keyring_entry(provider)?;
        entry.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => Error::CredentialsNotFound(provider.to_string()),
            _ => Error::Keyring(e.to_string()),
        })?;
        debug!(provider, "deleted API key from keyring");
        Ok(())
    }

    /// Where the credential for `provider` would be read from.
    pub fn credential_source(&self, provider: &str) -> Option<CredentialSource> {
        if self.get_from_keyring(provider).is_some() {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && self.get_from_env(provider).is_some() {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn keyring_entry(&self, provider: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, provider).map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, provider: &str) -> Option<ApiKey> {
        let entry = self.keyring_entry(provider).ok()?;
        entry.get_password().ok().map(ApiKey::new)
    }

    fn get_from_env(&self, provider: &str) -> Option<ApiKey> {
        let env_var = env_var_for_provider(provider)?;
        env::var(env_var).ok().map(ApiKey::new)
    }
}

/// Source of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Keyring,
    Environment,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Keyring => write!(f, "keyring"),
            CredentialSource::Environment => write!(f, "environment"),
        }
    }
}
