//! Terminal output helpers shared by the commands.

use dialoguer::console::style;
use std::io::{self, Write};
use tutor_core::{Assessment, LevelChange};

const HEADER_WIDTH: usize = 60;

/// Draws a boxed header with the given title.
pub fn print_header(title: &str) {
    let _ = print_header_to(&mut io::stdout(), title);
}

/// Draws a boxed header to a writer.
pub fn print_header_to<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    let border = "─".repeat(HEADER_WIDTH);
    writeln!(w, "┌{}┐", border)?;
    writeln!(w, "│ {:<width$} │", title, width = HEADER_WIDTH - 2)?;
    writeln!(w, "└{}┘", border)?;
    writeln!(w)?;
    Ok(())
}

/// Prints a success message with a green checkmark.
pub fn print_success(message: &str) {
    let _ = print_success_to(&mut io::stdout(), message);
}

pub fn print_success_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(w, "{} {}", style("✓").green().bold(), style(message).green())
}

/// Prints a warning with a yellow bang.
pub fn print_warning(message: &str) {
    let _ = print_warning_to(&mut io::stdout(), message);
}

pub fn print_warning_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(w, "{} {}", style("!").yellow().bold(), style(message).yellow())
}

/// Prints the tutor's side of a turn.
pub fn print_tutor(text: &str) {
    let _ = print_tutor_to(&mut io::stdout(), text);
}

pub fn print_tutor_to<W: Write>(w: &mut W, text: &str) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{}", style("Tutor").cyan().bold())?;
    writeln!(w, "{}", text.trim())?;
    writeln!(w)
}

/// Prints per-answer feedback and the score behind it.
pub fn print_feedback(feedback: &str, score: Option<u8>) {
    let _ = print_feedback_to(&mut io::stdout(), feedback, score);
}

pub fn print_feedback_to<W: Write>(
    w: &mut W,
    feedback: &str,
    score: Option<u8>,
) -> io::Result<()> {
    match score {
        Some(score) => writeln!(
            w,
            "{} {} {}",
            style("»").magenta().bold(),
            style(feedback).magenta(),
            style(format!("({score}/100)")).dim()
        ),
        None => writeln!(w, "{} {}", style("»").magenta().bold(), style(feedback).magenta()),
    }
}

/// Announces a difficulty change.
pub fn print_level_change(change: &LevelChange) {
    let _ = print_level_change_to(&mut io::stdout(), change);
}

pub fn print_level_change_to<W: Write>(w: &mut W, change: &LevelChange) -> io::Result<()> {
    if change.is_advance() {
        writeln!(
            w,
            "{} Moving up to {} questions!",
            style("▲").green().bold(),
            style(change.to).green().bold()
        )
    } else {
        writeln!(
            w,
            "{} Switching to {} questions for a bit.",
            style("▼").yellow().bold(),
            style(change.to).yellow().bold()
        )
    }
}

/// Prints the end-of-session assessment.
pub fn print_assessment(assessment: &Assessment) {
    let _ = print_assessment_to(&mut io::stdout(), assessment);
}

pub fn print_assessment_to<W: Write>(w: &mut W, assessment: &Assessment) -> io::Result<()> {
    writeln!(w, "{}", assessment.overall_summary.trim())?;

    for (title, items) in [
        ("Strengths", &assessment.strengths),
        ("Areas to improve", &assessment.areas_to_improve),
        ("Next steps", &assessment.next_steps),
    ] {
        if items.is_empty() {
            continue;
        }
        writeln!(w)?;
        writeln!(w, "{}", style(title).bold())?;
        for item in items {
            writeln!(w, "  • {}", item)?;
        }
    }

    if !assessment.concept_mastery.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}", style("Concept mastery").bold())?;
        for (concept, score) in &assessment.concept_mastery {
            writeln!(w, "  {:<32} {:>3}%", concept, score)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tutor_core::DifficultyLevel;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut output = Vec::new();
        f(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn header_draws_box_with_title() {
        let result = render(|w| print_header_to(w, "Solar System"));

        assert!(result.contains("┌"));
        assert!(result.contains("┘"));
        assert!(result.contains("Solar System"));
        let border = result.lines().next().unwrap();
        assert_eq!(border.chars().filter(|&c| c == '─').count(), HEADER_WIDTH);
    }

    #[test]
    fn feedback_includes_score_when_present() {
        let scored = render(|w| print_feedback_to(w, "Nice!", Some(72)));
        assert!(scored.contains("Nice!"));
        assert!(scored.contains("72/100"));

        let unscored = render(|w| print_feedback_to(w, "Keep going", None));
        assert!(!unscored.contains("/100"));
    }

    #[test]
    fn level_change_wording_follows_direction() {
        let up = LevelChange {
            from: DifficultyLevel::Medium,
            to: DifficultyLevel::Hard,
        };
        let down = LevelChange {
            from: DifficultyLevel::Medium,
            to: DifficultyLevel::Easy,
        };

        assert!(render(|w| print_level_change_to(w, &up)).contains("Moving up"));
        assert!(render(|w| print_level_change_to(w, &down)).contains("Switching to"));
    }

    #[test]
    fn assessment_skips_empty_sections() {
        let assessment = Assessment {
            strengths: vec!["Knows planet order".to_string()],
            areas_to_improve: vec![],
            next_steps: vec!["Read about moons".to_string()],
            concept_mastery: BTreeMap::from([("orbits".to_string(), 70)]),
            overall_summary: "Solid session.".to_string(),
        };

        let result = render(|w| print_assessment_to(w, &assessment));

        assert!(result.starts_with("Solid session."));
        assert!(result.contains("Knows planet order"));
        assert!(!result.contains("Areas to improve"));
        assert!(result.contains("orbits"));
        assert!(result.contains("70%"));
    }
}
