//! Extraction of the scoring tags the tutor appends to each reply.
//!
//! A scored reply ends with three tag lines:
//!
//! ```text
//! [SCORE:85]
//! [CONCEPTS:planet order=80,gravity basics=55]
//! [FEEDBACK:You're connecting gravity to orbits nicely!]
//! ```
//!
//! Models do not always honour the bracket syntax, so concepts and feedback
//! also accept a loose `CONCEPTS: ...` / `FEEDBACK: ...` form. A missing or
//! malformed tag is never an error; the corresponding field is simply absent.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::mastery::ConceptMastery;

/// Values extracted from one model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    /// Score for the student's last answer, when a valid tag was present.
    pub score: Option<u8>,
    pub feedback: Option<String>,
    /// Reply with every tag removed, ready to show the student.
    pub clean_response: String,
    /// Concepts whose mastery entry was written by this reply.
    pub concepts_updated: Vec<String>,
}

/// Per-turn information the parser needs beyond the raw text.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Display name of the session topic, used to name a fallback concept.
    pub topic_name: &'a str,
    /// True for the greeting turn, which is never scored.
    pub opening_turn: bool,
}

impl<'a> ParseContext<'a> {
    pub fn answer(topic_name: &'a str) -> Self {
        Self {
            topic_name,
            opening_turn: false,
        }
    }

    pub fn opening(topic_name: &'a str) -> Self {
        Self {
            topic_name,
            opening_turn: true,
        }
    }
}

/// Reply protocol seam. The session controller only talks to this trait.
pub trait ResponseParser: Send + Sync {
    /// Parse `raw`, writing concept updates into `mastery`.
    ///
    /// `mastery` is only touched when a score was parsed.
    fn parse(&self, raw: &str, ctx: &ParseContext<'_>, mastery: &mut ConceptMastery)
    -> ParsedReply;

    /// Remove tags without interpreting them.
    fn clean(&self, raw: &str) -> String;
}

struct Patterns {
    score: Regex,
    concepts: Regex,
    concepts_loose: Regex,
    feedback: Regex,
    feedback_loose: Regex,
    pair: Regex,
    strip: Vec<Regex>,
    blank_lines: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("tag pattern is a valid regex")
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    score: compile(r"(?i)\[SCORE:\s*(\d+)\s*\]"),
    concepts: compile(r"(?i)\[CONCEPTS:\s*([^\]]+)\]"),
    concepts_loose: compile(r"(?i)CONCEPTS:\s*(.+?)(?:\n|\[|$)"),
    feedback: compile(r"(?i)\[FEEDBACK:\s*([^\]]+)\]"),
    feedback_loose: compile(r"(?i)FEEDBACK:\s*(.+?)(?:\n|$)"),
    pair: compile(r"^\s*(.+?)\s*(?:=|:|-)\s*(-?\d+)\s*%?\s*$"),
    strip: vec![
        compile(r"(?i)\[SCORE:[^\]]*\]"),
        compile(r"(?i)\[CONCEPTS:[^\]]*\]"),
        compile(r"(?i)\[FEEDBACK:[^\]]*\]"),
        compile(r"(?i)CONCEPTS:[^\n\[]*"),
        compile(r"(?i)FEEDBACK:[^\n]*"),
    ],
    blank_lines: compile(r"\n[ \t]*\n(?:[ \t]*\n)+"),
});

const QUOTES: &[char] = &['"', '\'', '`', '“', '”', '‘', '’'];

/// Regex implementation of [`ResponseParser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TagParser;

impl TagParser {
    pub fn new() -> Self {
        Self
    }

    fn score(raw: &str) -> Option<u8> {
        let caps = PATTERNS.score.captures(raw)?;
        caps[1]
            .parse::<u32>()
            .ok()
            .filter(|s| *s <= 100)
            .and_then(|s| u8::try_from(s).ok())
    }

    fn feedback(raw: &str) -> Option<String> {
        PATTERNS
            .feedback
            .captures(raw)
            .or_else(|| PATTERNS.feedback_loose.captures(raw))
            .map(|caps| caps[1].trim().to_string())
            .filter(|text| !text.is_empty())
    }

    fn concept_payload(raw: &str) -> Option<&str> {
        PATTERNS
            .concepts
            .captures(raw)
            .or_else(|| PATTERNS.concepts_loose.captures(raw))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Split a `name=score, name: score; name - score` payload, discarding
    /// pairs with no name or a score outside 0..=100.
    pub fn concept_pairs(payload: &str) -> Vec<(String, u8)> {
        payload
            .split([',', ';'])
            .filter_map(|item| {
                let caps = PATTERNS.pair.captures(item)?;
                let name = caps[1].trim().trim_matches(QUOTES).trim();
                if name.is_empty() {
                    return None;
                }
                let score: i64 = caps[2].parse().ok()?;
                let score = u8::try_from(score).ok().filter(|s| *s <= 100)?;
                Some((name.to_string(), score))
            })
            .collect()
    }
}

/// Canned encouragement used when a scored reply carries no feedback.
pub fn default_feedback(score: u8) -> &'static str {
    match score {
        80.. => "Excellent work! You clearly understand this.",
        60..=79 => "Good job! You're making solid progress.",
        40..=59 => "You're getting there. Keep thinking it through!",
        _ => "Don't worry, mistakes help us learn. Let's keep going!",
    }
}

impl ResponseParser for TagParser {
    fn parse(
        &self,
        raw: &str,
        ctx: &ParseContext<'_>,
        mastery: &mut ConceptMastery,
    ) -> ParsedReply {
        let score = Self::score(raw);
        let mut feedback = Self::feedback(raw);
        let mut concepts_updated = Vec::new();

        if let Some(score) = score {
            if let Some(payload) = Self::concept_payload(raw) {
                for (name, value) in Self::concept_pairs(payload) {
                    mastery.record(name.clone(), value);
                    concepts_updated.push(name);
                }
            }

            if mastery.is_empty() && !ctx.opening_turn {
                let name = format!("{} basics", ctx.topic_name);
                mastery.record(name.clone(), score);
                concepts_updated.push(name);
            }

            if feedback.is_none() {
                feedback = Some(default_feedback(score).to_string());
            }
        }

        debug!(
            ?score,
            concepts = concepts_updated.len(),
            has_feedback = feedback.is_some(),
            "parsed tutor reply"
        );

        ParsedReply {
            score,
            feedback,
            clean_response: self.clean(raw),
            concepts_updated,
        }
    }

    fn clean(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        let mut stripped = false;

        for pattern in &PATTERNS.strip {
            if pattern.is_match(&text) {
                text = pattern.replace_all(&text, "").into_owned();
                stripped = true;
            }
        }

        if stripped {
            text = PATTERNS.blank_lines.replace_all(&text, "\n\n").into_owned();
        }
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mastery::MasteryStatus;

    fn parse(raw: &str) -> (ParsedReply, ConceptMastery) {
        let mut mastery = ConceptMastery::new();
        let parsed = TagParser.parse(raw, &ParseContext::answer("The Solar System"), &mut mastery);
        (parsed, mastery)
    }

    #[test]
    fn full_tag_block_is_extracted_and_stripped() {
        let raw = "Great thinking about orbits!\n\n[SCORE:85]\n[CONCEPTS:planet order=80,gravity basics=55]\n[FEEDBACK:You're connecting gravity to orbits nicely!]";
        let (parsed, mastery) = parse(raw);

        assert_eq!(parsed.score, Some(85));
        assert_eq!(
            parsed.feedback.as_deref(),
            Some("You're connecting gravity to orbits nicely!")
        );
        assert_eq!(parsed.clean_response, "Great thinking about orbits!");
        assert_eq!(parsed.concepts_updated, vec!["planet order", "gravity basics"]);
        assert_eq!(mastery.get("planet order").unwrap().status, MasteryStatus::High);
        assert_eq!(mastery.get("gravity basics").unwrap().score, 55);
        assert_eq!(mastery.get("gravity basics").unwrap().status, MasteryStatus::Medium);
    }

    #[test]
    fn tags_are_case_insensitive_and_allow_spaces() {
        let (parsed, _) = parse("Nice.\n[score: 64 ]\n[concepts: orbits: 70]");
        assert_eq!(parsed.score, Some(64));
        assert_eq!(parsed.concepts_updated, vec!["orbits"]);
        assert_eq!(parsed.clean_response, "Nice.");
    }

    #[test]
    fn reply_without_tags_is_left_alone() {
        let mut mastery = ConceptMastery::new();
        mastery.record("orbits", 40);
        let before = mastery.clone();

        let raw = "  What keeps the Moon in orbit around Earth?\n";
        let parsed = TagParser.parse(raw, &ParseContext::answer("The Solar System"), &mut mastery);

        assert_eq!(parsed.score, None);
        assert_eq!(parsed.feedback, None);
        assert_eq!(parsed.clean_response, raw.trim());
        assert!(parsed.concepts_updated.is_empty());
        assert_eq!(mastery, before);
    }

    #[test]
    fn out_of_range_score_is_absent() {
        let (parsed, mastery) = parse("Hmm.\n[SCORE:150]\n[CONCEPTS:orbits=70]");
        assert_eq!(parsed.score, None);
        assert!(mastery.is_empty());
        assert_eq!(parsed.clean_response, "Hmm.");

        let (parsed, _) = parse("[SCORE:99999999999999999999]");
        assert_eq!(parsed.score, None);
    }

    #[test]
    fn boundary_scores_are_accepted() {
        assert_eq!(parse("[SCORE:0]").0.score, Some(0));
        assert_eq!(parse("[SCORE:100]").0.score, Some(100));
    }

    #[test]
    fn out_of_range_concept_scores_are_dropped() {
        let (parsed, mastery) = parse("[SCORE:60]\n[CONCEPTS:x=150, orbits = 70, y=-5]");
        assert_eq!(parsed.concepts_updated, vec!["orbits"]);
        assert!(mastery.get("x").is_none());
        assert!(mastery.get("y").is_none());
    }

    #[test]
    fn concept_pairs_accept_all_separators_and_quotes() {
        let pairs = TagParser::concept_pairs(
            r#""planet order" = 80; 'gravity basics': 55, light-dependent reactions - 40, orbits=90%"#,
        );
        assert_eq!(
            pairs,
            vec![
                ("planet order".to_string(), 80),
                ("gravity basics".to_string(), 55),
                ("light-dependent reactions".to_string(), 40),
                ("orbits".to_string(), 90),
            ]
        );
    }

    #[test]
    fn concept_pairs_skip_garbage() {
        assert!(TagParser::concept_pairs("none yet, = 40, orbits").is_empty());
    }

    #[test]
    fn loose_concepts_and_feedback_are_understood() {
        let raw = "Good try.\n[SCORE:75]\nCONCEPTS: seasons=65\nFEEDBACK: Think about the tilt.";
        let (parsed, mastery) = parse(raw);

        assert_eq!(parsed.score, Some(75));
        assert_eq!(parsed.feedback.as_deref(), Some("Think about the tilt."));
        assert_eq!(mastery.get("seasons").unwrap().score, 65);
        assert_eq!(parsed.clean_response, "Good try.");
    }

    #[test]
    fn concepts_are_ignored_without_a_score() {
        let (parsed, mastery) = parse("Let's start.\n[CONCEPTS:orbits=70]\n[FEEDBACK:Welcome!]");
        assert_eq!(parsed.score, None);
        assert!(mastery.is_empty());
        assert_eq!(parsed.feedback.as_deref(), Some("Welcome!"));
        assert_eq!(parsed.clean_response, "Let's start.");
    }

    #[test]
    fn topic_basics_concept_is_synthesized_when_map_is_empty() {
        let (parsed, mastery) = parse("Right!\n[SCORE:82]");
        assert_eq!(parsed.concepts_updated, vec!["The Solar System basics"]);
        assert_eq!(mastery.get("The Solar System basics").unwrap().score, 82);
    }

    #[test]
    fn opening_turn_never_synthesizes() {
        let mut mastery = ConceptMastery::new();
        let parsed = TagParser.parse(
            "Hello!\n[SCORE:50]",
            &ParseContext::opening("The Solar System"),
            &mut mastery,
        );
        assert_eq!(parsed.score, Some(50));
        assert!(mastery.is_empty());
    }

    #[test]
    fn no_synthesis_when_map_already_has_entries() {
        let mut mastery = ConceptMastery::new();
        mastery.record("orbits", 70);
        TagParser.parse(
            "Yes.\n[SCORE:90]",
            &ParseContext::answer("The Solar System"),
            &mut mastery,
        );
        assert_eq!(mastery.len(), 1);
    }

    #[test]
    fn missing_feedback_gets_canned_text_by_band() {
        assert_eq!(parse("[SCORE:80]").0.feedback.as_deref(), Some(default_feedback(80)));
        assert_eq!(default_feedback(79), "Good job! You're making solid progress.");
        assert_eq!(default_feedback(40), "You're getting there. Keep thinking it through!");
        assert_eq!(
            default_feedback(39),
            "Don't worry, mistakes help us learn. Let's keep going!"
        );
    }

    #[test]
    fn untagged_score_wording_is_left_alone() {
        let raw = "  Nice! If a team's score: 12 and they add 3, what is the total?  ";
        let (parsed, mastery) = parse(raw);

        assert_eq!(parsed.score, None);
        assert_eq!(parsed.clean_response, raw.trim());
        assert!(mastery.is_empty());
    }

    #[test]
    fn clean_collapses_blank_runs_left_by_tags() {
        let cleaned = TagParser.clean("First part.\n\n[SCORE:70]\n\n\nSecond part.");
        assert_eq!(cleaned, "First part.\n\nSecond part.");
    }
}
