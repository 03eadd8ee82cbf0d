//! tutor-core: adaptive tutoring over a hosted language model
//!
//! This crate provides the pieces of a tutoring session:
//!
//! - **Topic catalog** - [`catalog`] static subjects with grade expectations
//! - **Curriculum** - [`curriculum::CurriculumFetcher`] reference text for prompts,
//!   backed by [`curriculum::store::JsonCurriculumStore`]
//! - **Prompt building** - [`prompt`] system instructions and the reply tag contract
//! - **Gateway** - [`AiGateway`] the single call out to a model provider
//! - **Reply parsing** - [`parser::TagParser`] score/concept/feedback extraction
//! - **Difficulty** - [`DifficultyEngine`] streak-driven level changes
//! - **Sessions** - [`SessionController`] the turn loop, and [`session::Summarizer`]
//! - **History** - [`history::JsonAssessmentStore`] finished-session assessments
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tutor_core::{MockGateway, SessionController, TurnOutcome};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = MockGateway::new();
//! gateway.queue_reply("Hi Sam! Which planet is closest to the Sun?");
//! gateway.queue_reply("Yes, Mercury!\n[SCORE:90]\n[CONCEPTS:planet order=90]\n[FEEDBACK:Great recall!]");
//!
//! let mut controller = SessionController::new(Arc::new(gateway));
//! let opening = controller.start_session("solar-system", 6, "Sam").await?;
//! println!("{opening}");
//!
//! if let TurnOutcome::Reply(reply) = controller.submit_answer("Mercury").await? {
//!     println!("{}", reply.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Turn flow
//!
//! ```text
//! answer ─▶ SessionController ─▶ prompt ─▶ AiGateway ─▶ ResponseParser
//!                  ▲                                        │
//!                  └──── history / mastery / difficulty ◀───┘
//! ```

pub mod catalog;
pub mod curriculum;
pub mod difficulty;
pub mod error;
pub mod gateway;
pub mod history;
pub mod mastery;
pub mod parser;
pub mod prompt;
pub mod session;
mod storage;

// Re-export key types for convenience
pub use catalog::Topic;
pub use difficulty::{DifficultyEngine, DifficultyLevel, LevelChange};
pub use error::{GatewayError, SessionError, StoreError, TutorError};
pub use gateway::{AiGateway, MockGateway, ProviderGateway};
pub use mastery::{ConceptMastery, ConceptScore, MasteryStatus};
pub use parser::{ParseContext, ParsedReply, ResponseParser, TagParser};
pub use session::{
    Assessment, Phase, SessionController, SessionState, Summarizer, TurnOutcome, TutorReply,
};
pub use tutor_models::providers::{Message, Role};
