//! API key management.
//!
//! Keys live in the system keyring under the `tutor` service. The matching
//! environment variables are honored as a fallback when reading.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::{Password, theme::ColorfulTheme};
use tutor_models::auth::{self, CredentialStore, SERVICE_NAME};

use crate::ui;

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store an API key (anthropic, openai, mistral)
    Set {
        /// Provider to configure
        provider: String,
    },
    /// Delete a stored API key
    Delete {
        /// Provider to remove
        provider: String,
    },
    /// Show which providers have a key and where it comes from
    List,
}

pub fn run(args: AuthArgs) -> Result<()> {
    let store = CredentialStore::new(SERVICE_NAME).with_env_fallback();

    match args.command {
        AuthCommand::Set { provider } => set_key(&store, &normalize(&provider)?),
        AuthCommand::Delete { provider } => delete_key(&store, &normalize(&provider)?),
        AuthCommand::List => list_keys(&store),
    }
}

fn normalize(provider: &str) -> Result<String> {
    let provider = provider.trim().to_ascii_lowercase();
    if auth::known_providers().any(|p| p == provider) {
        Ok(provider)
    } else {
        let known: Vec<&str> = auth::known_providers().collect();
        bail!(
            "Unknown provider '{}'. Valid: {}",
            provider,
            known.join(", ")
        )
    }
}

fn set_key(store: &CredentialStore, provider: &str) -> Result<()> {
    let env_hint = auth::env_var_for_provider(provider)
        .map(|v| format!(" (or set {})", v))
        .unwrap_or_default();

    println!("Enter API key for {}{}", provider, env_hint);

    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;

    if key.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    store.set(provider, key.trim())?;
    ui::print_success(&format!("Key for '{}' saved to keyring.", provider));
    Ok(())
}

fn delete_key(store: &CredentialStore, provider: &str) -> Result<()> {
    match store.delete(provider) {
        Ok(()) => ui::print_success(&format!("Key for '{}' deleted.", provider)),
        Err(tutor_models::Error::CredentialsNotFound(_)) => {
            println!("No stored key for '{}'.", provider);
        }
        Err(e) => bail!("Failed to delete key: {}", e),
    }
    Ok(())
}

fn list_keys(store: &CredentialStore) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Provider").fg(Color::Cyan),
        Cell::new("Source").fg(Color::Cyan),
        Cell::new("Env var").fg(Color::Cyan),
    ]);

    for provider in auth::known_providers() {
        let source = match store.credential_source(provider) {
            Some(source) => Cell::new(source).fg(Color::Green),
            None => Cell::new("not set").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(provider),
            source,
            Cell::new(auth::env_var_for_provider(provider).unwrap_or("-")),
        ]);
    }

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_known_providers_case_insensitively() {
        assert_eq!(normalize(" Anthropic ").unwrap(), "anthropic");
        assert_eq!(normalize("MISTRAL").unwrap(), "mistral");
    }

    #[test]
    fn normalize_rejects_unknown_provider() {
        let err = normalize("ollama").unwrap_err().to_string();
        assert!(err.contains("ollama"));
        assert!(err.contains("openai"));
    }
}
