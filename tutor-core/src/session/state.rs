//! Per-session state and the phase machine

use serde::{Deserialize, Serialize};

use crate::difficulty::{DifficultyEngine, DifficultyLevel};
use crate::mastery::ConceptMastery;
use tutor_models::providers::Message;

/// Where a session is in its lifecycle
///
/// Phases only move forward; [`SessionController::new_session`] is the
/// single way back to `Setup`.
///
/// [`SessionController::new_session`]: super::SessionController::new_session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No student chosen yet
    #[default]
    Setup,
    /// Student known, waiting for a topic
    TopicSelection,
    /// Question/answer loop running
    Chatting,
    /// Session ended, assessment available
    Summary,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "Setup",
            Phase::TopicSelection => "TopicSelection",
            Phase::Chatting => "Chatting",
            Phase::Summary => "Summary",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the controller tracks for one running session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub student_name: String,
    pub grade_level: u8,
    pub current_topic_key: Option<String>,
    /// Transcript as sent to the model (cleaned assistant replies only)
    pub conversation_history: Vec<Message>,
    /// Completed tutor turns, the opening question included
    pub question_count: u32,
    pub difficulty: DifficultyEngine,
    pub concept_mastery: ConceptMastery,
    pub score_history: Vec<u8>,
    pub hints_used: u32,
}

impl SessionState {
    pub fn new(student_name: impl Into<String>, grade_level: u8) -> Self {
        Self {
            student_name: student_name.into(),
            grade_level,
            ..Self::default()
        }
    }

    pub fn difficulty_level(&self) -> DifficultyLevel {
        self.difficulty.level()
    }

    /// Mean of all parsed scores, if any
    pub fn average_score(&self) -> Option<f64> {
        if self.score_history.is_empty() {
            return None;
        }
        let total: u32 = self.score_history.iter().map(|s| u32::from(*s)).sum();
        Some(f64::from(total) / self.score_history.len() as f64)
    }
}
