//! Running per-concept mastery model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Coarse mastery band derived from a concept score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryStatus {
    New,
    Low,
    Medium,
    High,
}

impl MasteryStatus {
    /// `high` above 70, `medium` from 50 through 70, `low` from 1, else `new`.
    pub fn from_score(score: u8) -> Self {
        match score {
            71.. => MasteryStatus::High,
            50..=70 => MasteryStatus::Medium,
            1..=49 => MasteryStatus::Low,
            0 => MasteryStatus::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryStatus::New => "new",
            MasteryStatus::Low => "low",
            MasteryStatus::Medium => "medium",
            MasteryStatus::High => "high",
        }
    }
}

impl std::fmt::Display for MasteryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest score for one concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptScore {
    pub score: u8,
    pub status: MasteryStatus,
}

impl ConceptScore {
    pub fn new(score: u8) -> Self {
        Self {
            score,
            status: MasteryStatus::from_score(score),
        }
    }
}

/// Concept name → latest score. Entries are overwritten, never removed
/// while a session is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptMastery(BTreeMap<String, ConceptScore>);

impl ConceptMastery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a concept. Scores above 100 are not representable here; callers
    /// drop them before recording.
    pub fn record(&mut self, concept: impl Into<String>, score: u8) -> ConceptScore {
        let entry = ConceptScore::new(score.min(100));
        self.0.insert(concept.into(), entry);
        entry
    }

    pub fn get(&self, concept: &str) -> Option<&ConceptScore> {
        self.0.get(concept)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConceptScore)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Plain name → score view, the shape used in assessments.
    pub fn scores(&self) -> BTreeMap<String, u8> {
        self.0.iter().map(|(k, v)| (k.clone(), v.score)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bands_follow_thresholds() {
        assert_eq!(MasteryStatus::from_score(100), MasteryStatus::High);
        assert_eq!(MasteryStatus::from_score(71), MasteryStatus::High);
        assert_eq!(MasteryStatus::from_score(70), MasteryStatus::Medium);
        assert_eq!(MasteryStatus::from_score(50), MasteryStatus::Medium);
        assert_eq!(MasteryStatus::from_score(49), MasteryStatus::Low);
        assert_eq!(MasteryStatus::from_score(1), MasteryStatus::Low);
        assert_eq!(MasteryStatus::from_score(0), MasteryStatus::New);
    }

    #[test]
    fn record_overwrites_previous_score() {
        let mut mastery = ConceptMastery::new();
        mastery.record("orbits", 40);
        mastery.record("orbits", 75);
        assert_eq!(mastery.len(), 1);
        assert_eq!(
            mastery.get("orbits"),
            Some(&ConceptScore {
                score: 75,
                status: MasteryStatus::High
            })
        );
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut mastery = ConceptMastery::new();
        mastery.record("gravity basics", 55);
        let json = serde_json::to_string(&mastery).unwrap();
        assert_eq!(json, r#"{"gravity basics":{"score":55,"status":"medium"}}"#);
    }
}
