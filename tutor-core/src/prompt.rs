//! System prompt construction.
//!
//! Every function here is pure: the same state, topic and curriculum text
//! always produce the same prompt.

use std::fmt::Write as _;

use crate::catalog::Topic;
use crate::difficulty::{ADVANCE_STREAK, DifficultyLevel, RETREAT_STREAK};
use crate::session::SessionState;

/// Prefix that marks a user turn as a hint request.
pub const HINT_MARKER: &str = "[HINT REQUEST]";

/// Text sent on the student's behalf when they ask for a hint.
pub const DEFAULT_HINT_TEXT: &str =
    "I'm stuck on this question. Can you give me a hint without telling me the answer?";

/// The tag contract the response parser depends on.
const OUTPUT_CONTRACT: &str = "\
## Response format (required)
End EVERY reply with these three lines, exactly in this form:
[SCORE:n]
[CONCEPTS:concept name=n,another concept=n]
[FEEDBACK:one short sentence of encouragement]

- SCORE is 0-100 and rates the student's most recent answer.
- CONCEPTS lists the concepts that answer touched, each with a 0-100 mastery estimate.
- FEEDBACK is shown to the student next to your reply.
- For a hint request, score how close the student was before asking.
The student never sees these lines, so do not refer to them.";

fn push_student_block(prompt: &mut String, state: &SessionState, topic: &Topic) {
    let _ = writeln!(
        prompt,
        "You are a patient, encouraging tutor working one-on-one with {}, a grade {} student, on the topic \"{}\".",
        display_name(&state.student_name),
        state.grade_level,
        topic.display_name
    );

    let expectations = topic.expectations_for(state.grade_level);
    if !expectations.is_empty() {
        let _ = writeln!(
            prompt,
            "\n## What a grade {} student should be able to do",
            state.grade_level
        );
        for item in expectations {
            let _ = writeln!(prompt, "- {item}");
        }
    }

    if !topic.progression_path.is_empty() {
        let _ = writeln!(
            prompt,
            "\n## Concept progression\nBuild understanding in this order: {}.",
            topic.progression_path.join(" → ")
        );
    }
}

fn push_curriculum_block(prompt: &mut String, curriculum_text: &str) {
    let text = curriculum_text.trim();
    if text.is_empty() {
        return;
    }
    let _ = writeln!(
        prompt,
        "\n## Classroom reference material\n\
         Use the material below to align your questions with what the class is studying. \
         Do not quote it verbatim to the student; paraphrase and ask about it instead.\n\n{text}"
    );
}

fn display_name(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() { "the student" } else { name }
}

/// Instructions for the current difficulty level, nudged by the streak counters.
pub fn difficulty_instructions(state: &SessionState) -> String {
    let engine = &state.difficulty;
    let mut block = String::from(match engine.level() {
        DifficultyLevel::Easy => {
            "Current difficulty: EASY. Ask short recall questions with one clear answer. \
             Offer a worked example before each new idea and keep vocabulary simple."
        }
        DifficultyLevel::Medium => {
            "Current difficulty: MEDIUM. Ask questions that need a sentence or two of explanation. \
             Connect new ideas to ones the student already showed they know."
        }
        DifficultyLevel::Hard => {
            "Current difficulty: HARD. Ask the student to explain reasoning, compare ideas, \
             or apply a concept to an unfamiliar situation."
        }
        DifficultyLevel::Challenge => {
            "Current difficulty: CHALLENGE. Pose multi-step problems and open-ended \"what if\" \
             questions that stretch beyond grade level. Expect justification, not just answers."
        }
    });

    let high = engine.consecutive_high_scores();
    let low = engine.consecutive_low_scores();
    if high > 0 && engine.level() != DifficultyLevel::Challenge {
        let _ = write!(
            block,
            "\nThe student has answered {high} question(s) in a row strongly ({} in a row raises the difficulty). \
             Keep the pace up.",
            ADVANCE_STREAK
        );
    } else if low > 0 {
        let _ = write!(
            block,
            "\nThe student struggled with the last {low} answer(s) ({} in a row lowers the difficulty). \
             Break the next question into smaller steps and reassure them.",
            RETREAT_STREAK
        );
    }
    block
}

/// System prompt for an answer or hint turn.
pub fn build_system_prompt(state: &SessionState, topic: &Topic, curriculum_text: &str) -> String {
    let mut prompt = String::new();
    push_student_block(&mut prompt, state, topic);

    let _ = writeln!(prompt, "\n## Difficulty\n{}", difficulty_instructions(state));
    let _ = writeln!(
        prompt,
        "\n## How to tutor\n\
         - Ask exactly one question at a time and wait for the answer.\n\
         - Never just give the answer; guide with questions.\n\
         - When a message starts with {HINT_MARKER}, give a small hint toward the current question, not the answer.\n\
         - Keep replies short and friendly, suitable for grade {}.",
        state.grade_level
    );

    push_curriculum_block(&mut prompt, curriculum_text);

    let _ = write!(prompt, "\n{OUTPUT_CONTRACT}");
    prompt
}

/// System prompt for the greeting turn. No scoring tags are requested.
pub fn build_opening_prompt(state: &SessionState, topic: &Topic, curriculum_text: &str) -> String {
    let mut prompt = String::new();
    push_student_block(&mut prompt, state, topic);
    push_curriculum_block(&mut prompt, curriculum_text);

    let _ = write!(
        prompt,
        "\n## Your task now\n\
         Greet {} warmly by name in one sentence, then ask a single opening question about \"{}\" \
         at {} difficulty that checks what they already know. \
         Do not add any score, concept or feedback lines to this message.",
        display_name(&state.student_name),
        topic.display_name,
        state.difficulty_level()
    );
    prompt
}

/// Seed user message that asks for the opening question.
pub fn opening_request(state: &SessionState, topic: &Topic) -> String {
    format!(
        "Hi! I'm {} and I'm ready to learn about {}.",
        display_name(&state.student_name),
        topic.display_name
    )
}

/// Strict-JSON instruction for the end-of-session summary.
pub fn build_summary_prompt(student_name: &str, grade: u8, topic_name: &str) -> String {
    format!(
        "You are reviewing a tutoring session with {student}, a grade {grade} student, on \"{topic_name}\".\n\
         Read the transcript and respond with ONLY a JSON object, no prose and no code fences, in this shape:\n\
         {{\n  \"strengths\": [\"...\"],\n  \"areasToImprove\": [\"...\"],\n  \"nextSteps\": [\"...\"],\n  \
         \"conceptMastery\": {{\"concept name\": 0}},\n  \"overallSummary\": \"...\"\n}}\n\
         conceptMastery values are integers from 0 to 100. Write for the student and their parents, \
         in plain encouraging language.",
        student = display_name(student_name),
    )
}

/// User turn text for a hint request.
pub fn hint_message(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        format!("{HINT_MARKER} {DEFAULT_HINT_TEXT}")
    } else {
        format!("{HINT_MARKER} {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn state(grade: u8) -> SessionState {
        let mut state = SessionState::new("Maya", grade);
        state.current_topic_key = Some("solar-system".into());
        state
    }

    fn solar() -> &'static Topic {
        catalog::find("solar-system").unwrap()
    }

    #[test]
    fn system_prompt_embeds_student_topic_and_grade_expectations() {
        let prompt = build_system_prompt(&state(6), solar(), "");
        assert!(prompt.contains("Maya"));
        assert!(prompt.contains("grade 6"));
        assert!(prompt.contains("The Solar System"));
        assert!(prompt.contains("Describe how gravity keeps planets and moons in orbit"));
        assert!(prompt.contains("planet order → orbits → gravity basics"));
    }

    #[test]
    fn system_prompt_carries_tag_contract() {
        let prompt = build_system_prompt(&state(6), solar(), "");
        assert!(prompt.contains("[SCORE:n]"));
        assert!(prompt.contains("[CONCEPTS:"));
        assert!(prompt.contains("[FEEDBACK:"));
    }

    #[test]
    fn missing_grade_uses_default_grade_expectations() {
        let prompt = build_system_prompt(&state(10), solar(), "");
        assert!(prompt.contains("Explain seasons using Earth's axial tilt"));
    }

    #[test]
    fn curriculum_is_included_only_when_present() {
        let without = build_system_prompt(&state(6), solar(), "   ");
        assert!(!without.contains("reference material"));

        let with = build_system_prompt(
            &state(6),
            solar(),
            "### Orbits\nPlanets travel in ellipses.",
        );
        assert!(with.contains("Planets travel in ellipses."));
        assert!(with.contains("Do not quote it verbatim"));
    }

    #[test]
    fn difficulty_block_follows_level_and_streaks() {
        let mut s = state(6);
        assert!(difficulty_instructions(&s).contains("MEDIUM"));

        s.difficulty.apply(Some(90));
        s.difficulty.apply(Some(90));
        let block = difficulty_instructions(&s);
        assert!(block.contains("2 question(s) in a row"));

        s.difficulty.apply(Some(10));
        let block = difficulty_instructions(&s);
        assert!(block.contains("struggled with the last 1"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let s = state(7);
        assert_eq!(
            build_system_prompt(&s, solar(), "text"),
            build_system_prompt(&s, solar(), "text")
        );
    }

    #[test]
    fn opening_prompt_asks_for_no_tags() {
        let prompt = build_opening_prompt(&state(6), solar(), "");
        assert!(prompt.contains("Greet Maya"));
        assert!(!prompt.contains("[SCORE:n]"));
    }

    #[test]
    fn summary_prompt_names_every_field() {
        let prompt = build_summary_prompt("Maya", 6, "The Solar System");
        for field in [
            "strengths",
            "areasToImprove",
            "nextSteps",
            "conceptMastery",
            "overallSummary",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn hint_message_is_marked() {
        assert!(hint_message("").starts_with(HINT_MARKER));
        assert_eq!(hint_message("what is mass?"), "[HINT REQUEST] what is mass?");
    }

    #[test]
    fn blank_name_reads_naturally() {
        let prompt = build_opening_prompt(&SessionState::new(" ", 6), solar(), "");
        assert!(prompt.contains("Greet the student"));
    }
}
