//! Curriculum administration.
//!
//! Documents added here are matched by topic and grade when a session starts
//! and embedded in the tutor's instructions as reference material.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tracing::info;
use tutor_core::catalog;
use tutor_core::curriculum::CurriculumItem;
use tutor_core::curriculum::store::JsonCurriculumStore;
use tutor_models::auth::{CredentialStore, SERVICE_NAME};
use tutor_models::ocr::OcrClient;

use crate::config::{ConfigLoader, TutorConfig};
use crate::ui;

/// Credential store entry used for PDF extraction
const OCR_PROVIDER: &str = "mistral";

#[derive(Debug, Args)]
pub struct CurriculumArgs {
    #[command(subcommand)]
    pub command: CurriculumCommand,
}

#[derive(Debug, Subcommand)]
pub enum CurriculumCommand {
    /// Add a document from a text file or a PDF
    Add {
        /// Document title
        #[arg(long)]
        title: String,

        /// Topic keys, comma separated (e.g. solar-system,weather)
        #[arg(long, value_delimiter = ',', required = true)]
        topics: Vec<String>,

        /// Grades, comma separated (e.g. 5,6)
        #[arg(long, value_delimiter = ',', required = true)]
        grades: Vec<u8>,

        /// Plain text or markdown file
        #[arg(long, conflicts_with = "pdf", required_unless_present = "pdf")]
        file: Option<PathBuf>,

        /// PDF to run through OCR
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// List all documents
    List,
    /// Print one document
    Show {
        /// Document id or unique id prefix
        id: String,
    },
    /// Include a document in sessions again
    Enable { id: String },
    /// Keep a document but stop using it in sessions
    Disable { id: String },
    /// Delete a document
    Remove { id: String },
}

pub async fn run(args: CurriculumArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let store = JsonCurriculumStore::new(config.curriculum.path.clone());

    match args.command {
        CurriculumCommand::Add {
            title,
            topics,
            grades,
            file,
            pdf,
        } => {
            let (content, source) = match (file, pdf) {
                (Some(path), _) => (read_text(&path).await?, path),
                (None, Some(path)) => (read_pdf(&config, &path).await?, path),
                (None, None) => bail!("Pass --file or --pdf"),
            };
            add(&store, title, topics, grades, content, &source).await
        }
        CurriculumCommand::List => list(&store).await,
        CurriculumCommand::Show { id } => show(&store, &id).await,
        CurriculumCommand::Enable { id } => toggle(&store, &id, true).await,
        CurriculumCommand::Disable { id } => toggle(&store, &id, false).await,
        CurriculumCommand::Remove { id } => {
            let removed = store.remove(&id).await?;
            ui::print_success(&format!("Removed '{}'", removed.title));
            Ok(())
        }
    }
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

async fn read_pdf(config: &TutorConfig, path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let store = CredentialStore::new(SERVICE_NAME).with_env_fallback();
    let key = match store.get(OCR_PROVIDER) {
        Ok(key) => key,
        Err(e) if e.is_credential() => {
            bail!("No usable OCR key ({e}). Run `tutor auth set {OCR_PROVIDER}` first.")
        }
        Err(e) => return Err(e.into()),
    };

    let mut client = OcrClient::new(key)?.with_model(&config.ocr.model);
    if let Some(url) = &config.ocr.base_url {
        client = client.with_base_url(url);
    }

    println!("Extracting text from {} ...", path.display());
    let document = client.extract_pdf(&bytes).await?;
    info!(pages = document.pages.len(), "extracted PDF text");

    Ok(document.to_markdown())
}

async fn add(
    store: &JsonCurriculumStore,
    title: String,
    topics: Vec<String>,
    grades: Vec<u8>,
    content: String,
    source: &Path,
) -> Result<()> {
    let title = title.trim().to_string();
    if title.is_empty() {
        bail!("Title cannot be empty");
    }
    if content.trim().is_empty() {
        bail!("{} contains no text", source.display());
    }

    let mut item = CurriculumItem::new(title, content, topics, grades);
    if let Some(name) = source.file_name() {
        item = item.with_source_file(name.to_string_lossy());
    }

    for unknown in unknown_topics(&item) {
        ui::print_warning(&format!(
            "'{}' is not a catalog topic; sessions will never match it",
            unknown
        ));
    }

    let item = store.add(item).await?;
    ui::print_success(&format!(
        "Added '{}' ({} chars) as {}",
        item.title,
        item.content.chars().count(),
        short_id(&item)
    ));
    Ok(())
}

async fn list(store: &JsonCurriculumStore) -> Result<()> {
    let items = store.list().await?;
    if items.is_empty() {
        println!("No curriculum documents.");
        println!();
        println!("Add one with: tutor curriculum add --title <title> --topics <keys> --grades <n> --file <path>");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Topics").fg(Color::Cyan),
        Cell::new("Grades").fg(Color::Cyan),
        Cell::new("Chars").fg(Color::Cyan),
        Cell::new("Active").fg(Color::Cyan),
    ]);

    for item in &items {
        let active = if item.is_active {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(short_id(item)),
            Cell::new(&item.title),
            Cell::new(join(&item.topics)),
            Cell::new(join(&item.grades)),
            Cell::new(item.content.chars().count()),
            active,
        ]);
    }

    println!("{table}");
    Ok(())
}

async fn show(store: &JsonCurriculumStore, id: &str) -> Result<()> {
    let item = store.get(id).await?;

    ui::print_header(&item.title);
    println!("ID:      {}", item.id);
    println!("Topics:  {}", join(&item.topics));
    println!("Grades:  {}", join(&item.grades));
    println!("Active:  {}", if item.is_active { "yes" } else { "no" });
    println!("Added:   {}", item.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(source) = &item.source_file {
        println!("Source:  {}", source);
    }
    println!();
    println!("{}", item.content.trim());
    Ok(())
}

async fn toggle(store: &JsonCurriculumStore, id: &str, active: bool) -> Result<()> {
    let item = store.set_active(id, active).await?;
    let verb = if active { "Enabled" } else { "Disabled" };
    ui::print_success(&format!("{} '{}'", verb, item.title));
    Ok(())
}

fn unknown_topics(item: &CurriculumItem) -> Vec<&str> {
    item.topics
        .iter()
        .map(String::as_str)
        .filter(|key| catalog::find(key).is_none())
        .collect()
}

fn short_id(item: &CurriculumItem) -> String {
    item.id.simple().to_string()[..8].to_string()
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
