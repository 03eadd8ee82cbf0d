//! Adaptive difficulty state machine.
//!
//! Levels move one step at a time: three high scores in a row advance,
//! two low scores in a row retreat. A turn without a parsed score changes
//! nothing.

use serde::{Deserialize, Serialize};

/// Score at or above which a turn counts toward advancing.
pub const HIGH_SCORE: u8 = 80;
/// Score below which a turn counts toward retreating.
pub const LOW_SCORE: u8 = 50;
/// Consecutive high scores needed to advance.
pub const ADVANCE_STREAK: u32 = 3;
/// Consecutive low scores needed to retreat.
pub const RETREAT_STREAK: u32 = 2;

/// Question complexity tier, ordered from easiest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
    Challenge,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 4] = [
        DifficultyLevel::Easy,
        DifficultyLevel::Medium,
        DifficultyLevel::Hard,
        DifficultyLevel::Challenge,
    ];

    /// One step harder, or `None` at the top.
    pub fn harder(self) -> Option<Self> {
        match self {
            DifficultyLevel::Easy => Some(DifficultyLevel::Medium),
            DifficultyLevel::Medium => Some(DifficultyLevel::Hard),
            DifficultyLevel::Hard => Some(DifficultyLevel::Challenge),
            DifficultyLevel::Challenge => None,
        }
    }

    /// One step easier, or `None` at the bottom.
    pub fn easier(self) -> Option<Self> {
        match self {
            DifficultyLevel::Easy => None,
            DifficultyLevel::Medium => Some(DifficultyLevel::Easy),
            DifficultyLevel::Hard => Some(DifficultyLevel::Medium),
            DifficultyLevel::Challenge => Some(DifficultyLevel::Hard),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
            DifficultyLevel::Challenge => "challenge",
        }
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A level transition produced by [`DifficultyEngine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
    pub from: DifficultyLevel,
    pub to: DifficultyLevel,
}

impl LevelChange {
    pub fn is_advance(&self) -> bool {
        self.to > self.from
    }
}

/// Current level plus the streak counters that drive transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyEngine {
    level: DifficultyLevel,
    consecutive_high_scores: u32,
    consecutive_low_scores: u32,
}

impl DifficultyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(level: DifficultyLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn level(&self) -> DifficultyLevel {
        self.level
    }

    pub fn consecutive_high_scores(&self) -> u32 {
        self.consecutive_high_scores
    }

    pub fn consecutive_low_scores(&self) -> u32 {
        self.consecutive_low_scores
    }

    /// Feed one turn's score. `None` is a no-op.
    pub fn apply(&mut self, score: Option<u8>) -> Option<LevelChange> {
        let score = score?;

        if score >= HIGH_SCORE {
            self.consecutive_high_scores += 1;
            self.consecutive_low_scores = 0;
        } else if score < LOW_SCORE {
            self.consecutive_low_scores += 1;
            self.consecutive_high_scores = 0;
        } else {
            self.consecutive_high_scores = 0;
            self.consecutive_low_scores = 0;
        }

        let from = self.level;

        // At the top (or bottom) the streak keeps counting; only the level is capped.
        if self.consecutive_high_scores >= ADVANCE_STREAK
            && let Some(next) = self.level.harder()
        {
            self.level = next;
            self.consecutive_high_scores = 0;
        } else if self.consecutive_low_scores >= RETREAT_STREAK
            && let Some(prev) = self.level.easier()
        {
            self.level = prev;
            self.consecutive_low_scores = 0;
        }

        (self.level != from).then_some(LevelChange {
            from,
            to: self.level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(engine: &mut DifficultyEngine, scores: &[u8]) -> Vec<Option<LevelChange>> {
        scores.iter().map(|s| engine.apply(Some(*s))).collect()
    }

    #[test]
    fn default_level_is_medium() {
        assert_eq!(DifficultyEngine::new().level(), DifficultyLevel::Medium);
    }

    #[test]
    fn three_high_scores_advance_and_reset_counter() {
        let mut engine = DifficultyEngine::new();
        let changes = feed(&mut engine, &[85, 90, 80]);

        assert_eq!(changes[..2], [None, None]);
        assert_eq!(
            changes[2],
            Some(LevelChange {
                from: DifficultyLevel::Medium,
                to: DifficultyLevel::Hard
            })
        );
        assert_eq!(engine.level(), DifficultyLevel::Hard);
        assert_eq!(engine.consecutive_high_scores(), 0);
    }

    #[test]
    fn two_low_scores_retreat() {
        let mut engine = DifficultyEngine::starting_at(DifficultyLevel::Hard);
        feed(&mut engine, &[30, 49]);
        assert_eq!(engine.level(), DifficultyLevel::Medium);
        assert_eq!(engine.consecutive_low_scores(), 0);
    }

    #[test]
    fn mid_score_breaks_both_streaks() {
        let mut engine = DifficultyEngine::new();
        feed(&mut engine, &[90, 90, 65, 90, 90]);
        assert_eq!(engine.level(), DifficultyLevel::Medium);
        assert_eq!(engine.consecutive_high_scores(), 2);

        let mut engine = DifficultyEngine::new();
        feed(&mut engine, &[20, 50, 20]);
        assert_eq!(engine.level(), DifficultyLevel::Medium);
        assert_eq!(engine.consecutive_low_scores(), 1);
    }

    #[test]
    fn opposite_score_resets_other_counter() {
        let mut engine = DifficultyEngine::new();
        feed(&mut engine, &[90, 90, 10]);
        assert_eq!(engine.consecutive_high_scores(), 0);
        assert_eq!(engine.consecutive_low_scores(), 1);
    }

    #[test]
    fn never_advances_past_challenge() {
        let mut engine = DifficultyEngine::starting_at(DifficultyLevel::Challenge);
        let changes = feed(&mut engine, &[100; 7]);
        assert!(changes.iter().all(Option::is_none));
        assert_eq!(engine.level(), DifficultyLevel::Challenge);
    }

    #[test]
    fn never_retreats_past_easy() {
        let mut engine = DifficultyEngine::new();
        feed(&mut engine, &[0, 0, 0, 0, 0, 0]);
        assert_eq!(engine.level(), DifficultyLevel::Easy);
    }

    #[test]
    fn none_score_is_a_no_op() {
        let mut engine = DifficultyEngine::new();
        feed(&mut engine, &[95, 95]);
        let before = engine.clone();

        assert_eq!(engine.apply(None), None);
        assert_eq!(engine, before);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(DifficultyLevel::Easy < DifficultyLevel::Challenge);
        assert_eq!(DifficultyLevel::ALL.len(), 4);
        assert_eq!(DifficultyLevel::Challenge.harder(), None);
        assert_eq!(DifficultyLevel::Easy.easier(), None);
    }
}
