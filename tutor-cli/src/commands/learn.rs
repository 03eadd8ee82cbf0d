//! Interactive tutoring session.
//!
//! Reads the student's answers line by line from stdin. Lines starting with
//! `/` are commands: `/hint`, `/status`, `/end`, `/help`. End of input ends
//! the session the same way `/end` does.

use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tutor_core::catalog::{self, Topic};
use tutor_core::curriculum::CurriculumFetcher;
use tutor_core::curriculum::store::JsonCurriculumStore;
use tutor_core::history::JsonAssessmentStore;
use tutor_core::{
    ProviderGateway, SessionController, SessionError, SessionState, TurnOutcome, TutorReply,
};
use tutor_models::auth::{CredentialStore, SERVICE_NAME};
use tutor_models::providers::{self, ProviderKind, ProviderSettings};

use crate::config::{ConfigLoader, TutorConfig};
use crate::ui;

#[derive(Debug, Args)]
pub struct LearnArgs {
    /// Topic key (see `tutor topics`)
    pub topic: Option<String>,

    /// Student name
    #[arg(long)]
    pub name: Option<String>,

    /// Grade level
    #[arg(long)]
    pub grade: Option<u8>,

    /// Provider override (anthropic, openai)
    #[arg(long)]
    pub provider: Option<String>,

    /// Model override
    #[arg(long)]
    pub model: Option<String>,

    /// Don't save the assessment to history
    #[arg(long)]
    pub no_save: bool,
}

/// One line of student input
#[derive(Debug, Clone, PartialEq, Eq)]
enum StudentInput {
    Answer(String),
    Hint,
    Status,
    Help,
    End,
    Empty,
    Unknown(String),
}

impl StudentInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return StudentInput::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return StudentInput::Answer(line.to_string());
        };
        match command.trim().to_ascii_lowercase().as_str() {
            "hint" | "h" => StudentInput::Hint,
            "status" | "s" => StudentInput::Status,
            "help" | "?" => StudentInput::Help,
            "end" | "quit" | "exit" | "q" => StudentInput::End,
            other => StudentInput::Unknown(other.to_string()),
        }
    }
}

pub async fn run(args: LearnArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let gateway = build_gateway(&config, &args)?;

    let store = JsonCurriculumStore::new(config.curriculum.path.clone());
    let fetcher =
        CurriculumFetcher::new(Arc::new(store)).with_max_chars(config.curriculum.max_chars);

    let name = resolve_name(&args, &config)?;
    let topic = resolve_topic(args.topic.as_deref())?;
    let grade = resolve_grade(&args, &config, topic)?;

    let mut controller = SessionController::new(Arc::new(gateway)).with_curriculum(fetcher);
    controller.select_student(&name, grade)?;

    ui::print_header(&format!("{}: grade {}", topic.display_name, grade));
    println!("Answer in your own words. Type /help for commands.");

    let opening = match controller.start_session(topic.key, grade, &name).await {
        Ok(opening) => opening,
        Err(SessionError::Gateway(e)) if e.is_credential() => {
            bail!(
                "{} Run `tutor auth set {}` to add a key.",
                tutor_core::session::controller::CREDENTIAL_MESSAGE,
                config.provider.name
            )
        }
        Err(e) => return Err(e.into()),
    };
    ui::print_tutor(&opening);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt_marker(&name);
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let outcome = match StudentInput::parse(&line) {
            StudentInput::Empty => continue,
            StudentInput::Help => {
                print_help();
                continue;
            }
            StudentInput::Status => {
                print_status(controller.state());
                continue;
            }
            StudentInput::Unknown(command) => {
                ui::print_warning(&format!("Unknown command '/{}'. Try /help.", command));
                continue;
            }
            StudentInput::End => break,
            StudentInput::Hint => controller.request_hint().await?,
            StudentInput::Answer(answer) => controller.submit_answer(&answer).await?,
        };

        match outcome {
            TurnOutcome::Reply(reply) => print_reply(&reply),
            TurnOutcome::Unavailable { message, error } => {
                warn!(%error, "tutor turn failed");
                ui::print_warning(&message);
            }
        }
    }

    println!("Wrapping up, putting together your summary...");
    let assessment = controller.end_session().await?;
    println!();
    ui::print_header("Session summary");
    ui::print_assessment(&assessment);

    if !args.no_save
        && let Some(record) = controller.assessment_record()
    {
        let history = JsonAssessmentStore::open_default();
        match history.append(record).await {
            Ok(()) => debug!(path = %history.path().display(), "assessment saved"),
            Err(e) => ui::print_warning(&format!("Could not save assessment: {}", e)),
        }
    }

    Ok(())
}

fn build_gateway(config: &TutorConfig, args: &LearnArgs) -> Result<ProviderGateway> {
    let provider_name = args.provider.as_deref().unwrap_or(&config.provider.name);
    let kind = ProviderKind::from_str(provider_name)?;

    let credentials = CredentialStore::new(SERVICE_NAME).with_env_fallback();
    let settings = ProviderSettings {
        base_url: config.provider.base_url.clone(),
        timeout: Some(Duration::from_secs(config.provider.timeout_secs)),
    };

    let provider = match providers::connect(kind, &credentials, &settings) {
        Ok(provider) => provider,
        Err(e) if e.is_credential() => {
            bail!(
                "No usable API key for {} ({}). Run `tutor auth set {}` first.",
                kind.as_str(),
                e,
                kind.as_str()
            )
        }
        Err(e) => return Err(e.into()),
    };

    let mut gateway = ProviderGateway::new(provider)
        .with_max_tokens(config.provider.max_tokens)
        .with_temperature(config.provider.temperature);
    if let Some(model) = args.model.as_ref().or(config.provider.model.as_ref()) {
        gateway = gateway.with_model(model);
    }

    debug!(
        provider = gateway.provider_name(),
        model = gateway.model(),
        "gateway ready"
    );
    Ok(gateway)
}

fn interactive() -> bool {
    std::io::stdin().is_terminal()
}

fn resolve_name(args: &LearnArgs, config: &TutorConfig) -> Result<String> {
    let configured = args
        .name
        .as_deref()
        .or(config.session.student_name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if let Some(name) = configured {
        return Ok(name.to_string());
    }
    if !interactive() {
        bail!("No student name given. Pass --name or set session.student_name in config.");
    }

    let name: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("What's your name?")
        .interact_text()?;
    Ok(name.trim().to_string())
}

fn resolve_topic(key: Option<&str>) -> Result<&'static Topic> {
    if let Some(key) = key {
        return match catalog::find(key) {
            Some(topic) => Ok(topic),
            None => bail!("Unknown topic '{}'. Run `tutor topics` to list them.", key),
        };
    }
    if !interactive() {
        bail!("No topic given. Pass a topic key; `tutor topics` lists them.");
    }

    let topics = catalog::all();
    let names: Vec<&str> = topics.iter().map(|t| t.display_name).collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What would you like to learn about?")
        .items(&names)
        .default(0)
        .interact()?;
    Ok(&topics[index])
}

fn resolve_grade(args: &LearnArgs, config: &TutorConfig, topic: &Topic) -> Result<u8> {
    if let Some(grade) = args.grade {
        return Ok(grade);
    }
    if !interactive() {
        return Ok(config.session.grade);
    }

    let grades = topic.grades();
    let labels: Vec<String> = grades.iter().map(|g| format!("Grade {}", g)).collect();
    let default = grades
        .iter()
        .position(|g| *g == config.session.grade)
        .unwrap_or(0);
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which grade are you in?")
        .items(&labels)
        .default(default)
        .interact()?;
    Ok(grades.get(index).copied().unwrap_or(config.session.grade))
}

fn prompt_marker(name: &str) {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}> ", name);
    let _ = stdout.flush();
}

fn print_reply(reply: &TutorReply) {
    if let Some(feedback) = &reply.feedback {
        ui::print_feedback(feedback, reply.score);
    }
    if let Some(change) = &reply.level_change {
        ui::print_level_change(change);
    }
    ui::print_tutor(&reply.text);
}

fn print_help() {
    println!("  /hint    ask for a hint on the current question");
    println!("  /status  show difficulty and concept mastery so far");
    println!("  /end     finish and see your summary");
}

fn print_status(state: &SessionState) {
    println!(
        "Question {} · difficulty {} · {} hint(s) used",
        state.question_count,
        state.difficulty_level(),
        state.hints_used
    );
    if let Some(avg) = state.average_score() {
        println!("Average score: {:.0}", avg);
    }
    if state.concept_mastery.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Concept").fg(Color::Cyan),
        Cell::new("Score").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);
    for (concept, entry) in state.concept_mastery.iter() {
        table.add_row(vec![
            Cell::new(concept),
            Cell::new(entry.score),
            Cell::new(entry.status),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_an_answer() {
        assert_eq!(
            StudentInput::parse("  Mercury is closest  "),
            StudentInput::Answer("Mercury is closest".to_string())
        );
    }

    #[test]
    fn slash_commands_are_recognized() {
        assert_eq!(StudentInput::parse("/hint"), StudentInput::Hint);
        assert_eq!(StudentInput::parse("/HINT"), StudentInput::Hint);
        assert_eq!(StudentInput::parse("/status"), StudentInput::Status);
        assert_eq!(StudentInput::parse("/quit"), StudentInput::End);
        assert_eq!(StudentInput::parse("/?"), StudentInput::Help);
        assert_eq!(
            StudentInput::parse("/dance"),
            StudentInput::Unknown("dance".to_string())
        );
    }

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(StudentInput::parse("   "), StudentInput::Empty);
    }
}
