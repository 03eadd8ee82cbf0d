//! End-of-session assessment
//!
//! The summarizer sends the whole transcript back to the model with a
//! strict-JSON instruction. Anything short of a usable JSON object falls
//! back to a fixed, generic assessment so ending a session never fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::gateway::AiGateway;
use crate::prompt::{HINT_MARKER, build_summary_prompt};
use tutor_models::providers::{Message, Role};

/// Structured end-of-session report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assessment {
    pub strengths: Vec<String>,
    pub areas_to_improve: Vec<String>,
    pub next_steps: Vec<String>,
    /// Concept name to 0-100 mastery
    #[serde(deserialize_with = "lenient_mastery")]
    pub concept_mastery: BTreeMap<String, u8>,
    pub overall_summary: String,
}

impl Assessment {
    /// Generic assessment used when the model's summary is unusable
    pub fn fallback() -> Self {
        Self {
            strengths: vec!["Stayed engaged and worked through the tutor's questions".to_string()],
            areas_to_improve: vec![
                "Keep practicing the concepts covered in this session".to_string(),
            ],
            next_steps: vec![
                "Review today's questions, then start a new session on this topic".to_string(),
            ],
            concept_mastery: BTreeMap::new(),
            overall_summary: "Great effort today! A detailed summary isn't available right now, \
                              but every question you worked through helped build your understanding."
                .to_string(),
        }
    }

    /// True when the model returned nothing worth showing
    pub fn is_blank(&self) -> bool {
        self.strengths.is_empty()
            && self.areas_to_improve.is_empty()
            && self.next_steps.is_empty()
            && self.concept_mastery.is_empty()
            && self.overall_summary.trim().is_empty()
    }
}

/// Keep numeric entries in 0..=100; drop everything else.
fn lenient_mastery<'de, D>(deserializer: D) -> Result<BTreeMap<String, u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, value)| {
            let score = value.as_f64()?.round();
            (0.0..=100.0)
                .contains(&score)
                .then(|| (name.trim().to_string(), score as u8))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect())
}

/// Produces an [`Assessment`] from a finished transcript
#[derive(Clone)]
pub struct Summarizer {
    gateway: Arc<dyn AiGateway>,
}

impl Summarizer {
    pub fn new(gateway: Arc<dyn AiGateway>) -> Self {
        Self { gateway }
    }

    /// Summarize a session. Never fails; see [`Assessment::fallback`].
    pub async fn summarize(
        &self,
        history: &[Message],
        student_name: &str,
        grade: u8,
        topic_name: &str,
    ) -> Assessment {
        let system = build_summary_prompt(student_name, grade, topic_name);
        let request = vec![Message::user(format!(
            "Here is the full tutoring transcript:\n\n{}",
            format_transcript(history, student_name)
        ))];

        let raw = match self.gateway.complete(&request, &system).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "summary request failed, using fallback assessment");
                return Assessment::fallback();
            }
        };

        match parse_assessment(&raw) {
            Some(assessment) => {
                debug!(
                    strengths = assessment.strengths.len(),
                    concepts = assessment.concept_mastery.len(),
                    "parsed session summary"
                );
                assessment
            }
            None => {
                warn!("summary reply had no usable JSON, using fallback assessment");
                Assessment::fallback()
            }
        }
    }
}

/// Render the transcript as plain labelled lines.
pub fn format_transcript(history: &[Message], student_name: &str) -> String {
    let student = match student_name.trim() {
        "" => "Student",
        name => name,
    };

    history
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| match m.role {
            Role::Assistant => format!("Tutor: {}", m.content.trim()),
            _ => match m.content.trim().strip_prefix(HINT_MARKER) {
                Some(rest) => format!("{student} (asked for a hint): {}", rest.trim()),
                None => format!("{student}: {}", m.content.trim()),
            },
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the first balanced JSON object in `text`.
///
/// Returns `None` when there is no object, it does not deserialize, or it
/// carries no content at all.
pub fn parse_assessment(text: &str) -> Option<Assessment> {
    let json = first_json_object(text)?;
    let assessment: Assessment = serde_json::from_str(json).ok()?;
    (!assessment.is_blank()).then_some(assessment)
}

/// Slice of the first `{...}` block whose braces balance, ignoring braces
/// inside JSON strings.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
