//! Tutoring session management

pub mod controller;
pub mod state;
pub mod summarizer;

// Re-export key types for convenience
pub use controller::{SessionController, TurnOutcome, TutorReply};
pub use state::{Phase, SessionState};
pub use summarizer::{Assessment, Summarizer};
