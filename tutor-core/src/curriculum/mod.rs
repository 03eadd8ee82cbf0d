//! Curriculum reference text for prompts
//!
//! A [`CurriculumSource`] answers "which documents apply to this topic and
//! grade". The [`CurriculumFetcher`] flattens the matches into a single
//! bounded block of text for the prompt builder.

pub mod store;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;

pub use store::JsonCurriculumStore;

/// Largest curriculum block handed to the prompt builder, in characters
pub const DEFAULT_MAX_CHARS: usize = 8000;

/// Appended when curriculum text was cut
pub const TRUNCATION_MARKER: &str = "\n[...truncated]";

/// One document in the curriculum collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Topic keys this document applies to
    pub topics: BTreeSet<String>,
    pub grades: BTreeSet<u8>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Name of the file the content was imported from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl CurriculumItem {
    /// New active item with a fresh id
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        topics: impl IntoIterator<Item = String>,
        grades: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            topics: topics.into_iter().map(|t| t.trim().to_lowercase()).collect(),
            grades: grades.into_iter().collect(),
            is_active: true,
            created_at: Utc::now(),
            source_file: None,
        }
    }

    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }

    /// Active, tagged with `topic_key`, and tagged with `grade`
    pub fn applies_to(&self, topic_key: &str, grade: u8) -> bool {
        self.is_active && self.topics.contains(topic_key) && self.grades.contains(&grade)
    }
}

/// A collection of curriculum documents
#[async_trait]
pub trait CurriculumSource: Send + Sync {
    /// Items that apply to `topic_key` at `grade`
    async fn items_for(&self, topic_key: &str, grade: u8)
    -> Result<Vec<CurriculumItem>, StoreError>;
}

/// Builds the curriculum block embedded in system prompts
#[derive(Clone)]
pub struct CurriculumFetcher {
    source: Arc<dyn CurriculumSource>,
    max_chars: usize,
}

impl CurriculumFetcher {
    pub fn new(source: Arc<dyn CurriculumSource>) -> Self {
        Self {
            source,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Concatenated, truncated text of every matching item
    pub async fn fetch(&self, topic_key: &str, grade: u8) -> Result<String, StoreError> {
        let items = self.source.items_for(topic_key, grade).await?;
        let matching: Vec<&CurriculumItem> =
            items.iter().filter(|i| i.applies_to(topic_key, grade)).collect();

        debug!(topic_key, grade, items = matching.len(), "fetched curriculum");

        let text = format_items(&matching);
        Ok(truncate_chars(&text, self.max_chars))
    }

    /// Like [`fetch`](Self::fetch), but a failure yields empty text
    pub async fn fetch_or_empty(&self, topic_key: &str, grade: u8) -> String {
        match self.fetch(topic_key, grade).await {
            Ok(text) => text,
            Err(e) => {
                warn!(topic_key, grade, error = %e, "curriculum unavailable, continuing without it");
                String::new()
            }
        }
    }
}

fn format_items(items: &[&CurriculumItem]) -> String {
    items
        .iter()
        .map(|item| format!("### {}\n{}", item.title.trim(), item.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Keep the first `max_chars` characters of `text`, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<CurriculumItem>);

    #[async_trait]
    impl CurriculumSource for StaticSource {
        async fn items_for(
            &self,
            _topic_key: &str,
            _grade: u8,
        ) -> Result<Vec<CurriculumItem>, StoreError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CurriculumSource for FailingSource {
        async fn items_for(
            &self,
            _topic_key: &str,
            _grade: u8,
        ) -> Result<Vec<CurriculumItem>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("database offline")))
        }
    }

    fn item(title: &str, content: &str, topic: &str, grade: u8) -> CurriculumItem {
        CurriculumItem::new(title, content, [topic.to_string()], [grade])
    }

    #[tokio::test]
    async fn matching_items_get_title_headers() {
        let source = StaticSource(vec![
            item("Orbits", "Planets travel around the Sun.", "solar-system", 6),
            item("Gravity", "Mass attracts mass.", "solar-system", 6),
        ]);
        let fetcher = CurriculumFetcher::new(Arc::new(source));

        let text = fetcher.fetch("solar-system", 6).await.unwrap();
        assert_eq!(
            text,
            "### Orbits\nPlanets travel around the Sun.\n\n### Gravity\nMass attracts mass."
        );
    }

    #[tokio::test]
    async fn inactive_and_mismatched_items_are_skipped() {
        let mut inactive = item("Old", "stale", "solar-system", 6);
        inactive.is_active = false;
        let source = StaticSource(vec![
            inactive,
            item("Wrong grade", "x", "solar-system", 9),
            item("Wrong topic", "y", "fractions", 6),
        ]);
        let fetcher = CurriculumFetcher::new(Arc::new(source));

        assert_eq!(fetcher.fetch("solar-system", 6).await.unwrap(), "");
    }

    #[tokio::test]
    async fn long_text_is_truncated_to_exact_length_plus_marker() {
        let source = StaticSource(vec![item("Long", &"a".repeat(9000), "solar-system", 6)]);
        let fetcher = CurriculumFetcher::new(Arc::new(source));

        let text = fetcher.fetch("solar-system", 6).await.unwrap();
        let body = text.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert_eq!(body.chars().count(), DEFAULT_MAX_CHARS);
    }

    #[tokio::test]
    async fn failing_source_degrades_to_empty_text() {
        let fetcher = CurriculumFetcher::new(Arc::new(FailingSource));
        assert!(fetcher.fetch("solar-system", 6).await.is_err());
        assert_eq!(fetcher.fetch_or_empty("solar-system", 6).await, "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "🌍🌎🌏🪐";
        assert_eq!(truncate_chars(text, 2), format!("🌍🌎{TRUNCATION_MARKER}"));
        assert_eq!(truncate_chars(text, 4), text);
        assert_eq!(truncate_chars("short", 8000), "short");
    }

    #[test]
    fn item_topics_are_normalized() {
        let item = CurriculumItem::new("t", "c", [" Solar-System ".to_string()], [6]);
        assert!(item.applies_to("solar-system", 6));
    }
}
