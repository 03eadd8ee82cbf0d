//! The session controller and its turn loop
//!
//! A [`SessionController`] owns one [`SessionState`] and moves it through
//! [`Phase`]s. Each turn builds a system prompt, makes exactly one gateway
//! call, parses the reply, feeds the score to the difficulty engine, and
//! appends the cleaned reply to the transcript.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::{Phase, SessionState};
use super::summarizer::{Assessment, Summarizer};
use crate::catalog::{self, Topic};
use crate::curriculum::CurriculumFetcher;
use crate::difficulty::LevelChange;
use crate::error::{GatewayError, SessionError};
use crate::gateway::AiGateway;
use crate::history::AssessmentRecord;
use crate::mastery::ConceptMastery;
use crate::parser::{ParseContext, ResponseParser, TagParser};
use crate::prompt;
use tutor_models::providers::Message;

/// Shown to the student when a turn's gateway call fails
pub const TROUBLE_MESSAGE: &str =
    "Sorry, I'm having trouble understanding right now. Could you try sending that again?";

/// Shown when the failure is a missing or rejected API key
pub const CREDENTIAL_MESSAGE: &str =
    "I can't reach the tutoring service because no valid API key is set up. \
     Ask a grown-up to check the settings, then try again.";

/// A completed tutor turn
#[derive(Debug, Clone, PartialEq)]
pub struct TutorReply {
    /// Cleaned reply text, safe to display
    pub text: String,
    pub feedback: Option<String>,
    pub score: Option<u8>,
    pub level_change: Option<LevelChange>,
    pub concepts_updated: Vec<String>,
    /// Question count after this turn
    pub question_count: u32,
    /// Whether this turn was a hint request
    pub hint: bool,
}

/// Result of submitting an answer or asking for a hint
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The tutor replied and the session state advanced
    Reply(TutorReply),
    /// The gateway failed. Nothing changed; the student may resend.
    Unavailable { message: String, error: GatewayError },
}

/// Drives one tutoring session at a time
pub struct SessionController {
    gateway: Arc<dyn AiGateway>,
    curriculum: Option<CurriculumFetcher>,
    parser: Box<dyn ResponseParser>,
    summarizer: Summarizer,
    phase: Phase,
    state: SessionState,
    topic: Option<&'static Topic>,
    curriculum_text: String,
    awaiting_reply: bool,
    assessment: Option<Assessment>,
}

impl SessionController {
    /// Controller with the tag parser and no curriculum source
    pub fn new(gateway: Arc<dyn AiGateway>) -> Self {
        Self {
            summarizer: Summarizer::new(gateway.clone()),
            gateway,
            curriculum: None,
            parser: Box::new(TagParser::new()),
            phase: Phase::Setup,
            state: SessionState::default(),
            topic: None,
            curriculum_text: String::new(),
            awaiting_reply: false,
            assessment: None,
        }
    }

    pub fn with_curriculum(mut self, fetcher: CurriculumFetcher) -> Self {
        self.curriculum = Some(fetcher);
        self
    }

    pub fn with_parser(mut self, parser: Box<dyn ResponseParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn topic(&self) -> Option<&'static Topic> {
        self.topic
    }

    /// Curriculum text embedded in this session's prompts
    pub fn curriculum_text(&self) -> &str {
        &self.curriculum_text
    }

    /// The assessment, once the session has ended
    pub fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    /// True while a gateway call for this session is outstanding
    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Record who is learning. Setup → TopicSelection.
    pub fn select_student(&mut self, name: &str, grade: u8) -> Result<(), SessionError> {
        self.expect_phase(&[Phase::Setup])?;
        self.state = SessionState::new(name.trim(), grade);
        self.phase = Phase::TopicSelection;
        debug!(student = %self.state.student_name, grade, "student selected");
        Ok(())
    }

    /// Start a session and return the opening question.
    ///
    /// A gateway failure is returned as an error and leaves the controller
    /// in the phase it was in.
    pub async fn start_session(
        &mut self,
        topic_key: &str,
        grade: u8,
        student_name: &str,
    ) -> Result<String, SessionError> {
        self.expect_phase(&[Phase::Setup, Phase::TopicSelection])?;
        self.ensure_idle()?;

        let topic =
            catalog::find(topic_key).ok_or_else(|| SessionError::UnknownTopic(topic_key.into()))?;

        let mut state = SessionState::new(student_name.trim(), grade);
        state.current_topic_key = Some(topic.key.to_string());

        let curriculum_text = match &self.curriculum {
            Some(fetcher) => fetcher.fetch_or_empty(topic.key, grade).await,
            None => String::new(),
        };

        let system = prompt::build_opening_prompt(&state, topic, &curriculum_text);
        let seed = [Message::user(prompt::opening_request(&state, topic))];

        info!(
            student = %state.student_name,
            grade,
            topic = topic.key,
            curriculum_chars = curriculum_text.chars().count(),
            "starting tutoring session"
        );

        self.awaiting_reply = true;
        let result = self.gateway.complete(&seed, &system).await;
        self.awaiting_reply = false;
        let raw = result?;

        // Opening replies are never scored; parse into a scratch map just to clean.
        let opening = self
            .parser
            .parse(
                &raw,
                &ParseContext::opening(topic.display_name),
                &mut ConceptMastery::new(),
            )
            .clean_response;

        state.conversation_history = vec![Message::assistant(opening.clone())];
        state.question_count = 1;

        self.state = state;
        self.topic = Some(topic);
        self.curriculum_text = curriculum_text;
        self.assessment = None;
        self.phase = Phase::Chatting;
        Ok(opening)
    }

    /// Send the student's answer
    pub async fn submit_answer(&mut self, answer: &str) -> Result<TurnOutcome, SessionError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.run_turn(answer.to_string(), false).await
    }

    /// Ask for a hint on the current question. Scored like any other turn.
    pub async fn request_hint(&mut self) -> Result<TurnOutcome, SessionError> {
        self.run_turn(prompt::hint_message(""), true).await
    }

    async fn run_turn(&mut self, content: String, hint: bool) -> Result<TurnOutcome, SessionError> {
        self.expect_phase(&[Phase::Chatting])?;
        self.ensure_idle()?;
        let topic = self.topic.ok_or_else(|| self.phase_error(&[Phase::Chatting]))?;

        let system = prompt::build_system_prompt(&self.state, topic, &self.curriculum_text);
        self.state.conversation_history.push(Message::user(content));

        self.awaiting_reply = true;
        let result = self
            .gateway
            .complete(&self.state.conversation_history, &system)
            .await;
        self.awaiting_reply = false;

        let raw = match result {
            Ok(raw) => raw,
            Err(error) => {
                self.state.conversation_history.pop();
                warn!(error = %error, hint, "tutor turn failed");
                let message = if error.is_credential() {
                    CREDENTIAL_MESSAGE
                } else {
                    TROUBLE_MESSAGE
                };
                return Ok(TurnOutcome::Unavailable {
                    message: message.to_string(),
                    error,
                });
            }
        };

        let parsed = self.parser.parse(
            &raw,
            &ParseContext::answer(topic.display_name),
            &mut self.state.concept_mastery,
        );

        let level_change = self.state.difficulty.apply(parsed.score);
        if let Some(score) = parsed.score {
            self.state.score_history.push(score);
        }
        if let Some(change) = level_change {
            info!(from = %change.from, to = %change.to, "difficulty changed");
        }

        self.state
            .conversation_history
            .push(Message::assistant(parsed.clean_response.clone()));
        self.state.question_count += 1;
        if hint {
            self.state.hints_used += 1;
        }

        debug!(
            question_count = self.state.question_count,
            score = ?parsed.score,
            level = %self.state.difficulty_level(),
            "turn complete"
        );

        Ok(TurnOutcome::Reply(TutorReply {
            text: parsed.clean_response,
            feedback: parsed.feedback,
            score: parsed.score,
            level_change,
            concepts_updated: parsed.concepts_updated,
            question_count: self.state.question_count,
            hint,
        }))
    }

    /// Summarize the transcript and move to the summary phase.
    ///
    /// The summarizer never fails. When its assessment has no concept
    /// scores, the mastery tracked during the session is used instead.
    pub async fn end_session(&mut self) -> Result<Assessment, SessionError> {
        self.expect_phase(&[Phase::Chatting])?;
        self.ensure_idle()?;
        let topic_name = self.topic.map(|t| t.display_name).unwrap_or_default();

        self.awaiting_reply = true;
        let mut assessment = self
            .summarizer
            .summarize(
                &self.state.conversation_history,
                &self.state.student_name,
                self.state.grade_level,
                topic_name,
            )
            .await;
        self.awaiting_reply = false;

        if assessment.concept_mastery.is_empty() {
            assessment.concept_mastery = self.state.concept_mastery.scores();
        }

        info!(
            student = %self.state.student_name,
            questions = self.state.question_count,
            hints = self.state.hints_used,
            "session ended"
        );

        self.assessment = Some(assessment.clone());
        self.phase = Phase::Summary;
        Ok(assessment)
    }

    /// Package the finished session for the assessment history
    pub fn assessment_record(&self) -> Option<AssessmentRecord> {
        if self.phase != Phase::Summary {
            return None;
        }
        let topic = self.topic?;
        let assessment = self.assessment.clone()?;

        Some(AssessmentRecord {
            id: Uuid::new_v4(),
            student_name: self.state.student_name.clone(),
            grade: self.state.grade_level,
            topic_key: topic.key.to_string(),
            topic_name: topic.display_name.to_string(),
            completed_at: Utc::now(),
            question_count: self.state.question_count,
            hints_used: self.state.hints_used,
            score_history: self.state.score_history.clone(),
            final_difficulty: self.state.difficulty_level(),
            assessment,
        })
    }

    /// Discard everything and return to `Setup`
    pub fn new_session(&mut self) {
        self.phase = Phase::Setup;
        self.state = SessionState::default();
        self.topic = None;
        self.curriculum_text.clear();
        self.awaiting_reply = false;
        self.assessment = None;
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.awaiting_reply {
            return Err(SessionError::TurnInProgress);
        }
        Ok(())
    }

    fn expect_phase(&self, allowed: &[Phase]) -> Result<(), SessionError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(self.phase_error(allowed))
        }
    }

    fn phase_error(&self, expected: &[Phase]) -> SessionError {
        SessionError::InvalidPhase {
            expected: expected
                .iter()
                .map(Phase::as_str)
                .collect::<Vec<_>>()
                .join(" or "),
            actual: self.phase.to_string(),
        }
    }
}
