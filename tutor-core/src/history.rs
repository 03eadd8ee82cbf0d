//! Finished-session assessment history

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::difficulty::DifficultyLevel;
use crate::error::StoreError;
use crate::session::Assessment;
use crate::storage::{read_json, write_json};

/// One completed session, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub id: Uuid,
    pub student_name: String,
    pub grade: u8,
    pub topic_key: String,
    pub topic_name: String,
    pub completed_at: DateTime<Utc>,
    pub question_count: u32,
    pub hints_used: u32,
    pub score_history: Vec<u8>,
    pub final_difficulty: DifficultyLevel,
    pub assessment: Assessment,
}

impl AssessmentRecord {
    /// Mean of the recorded scores
    pub fn average_score(&self) -> Option<f64> {
        if self.score_history.is_empty() {
            return None;
        }
        let total: u32 = self.score_history.iter().map(|s| u32::from(*s)).sum();
        Some(f64::from(total) / self.score_history.len() as f64)
    }
}

/// Assessment records kept in a JSON array on disk
pub struct JsonAssessmentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonAssessmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn open_default() -> Self {
        Self::new(tutor_paths::assessments_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: AssessmentRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records: Vec<AssessmentRecord> = read_json(&self.path).await?;
        info!(
            id = %record.id,
            student = %record.student_name,
            topic = %record.topic_key,
            "saving assessment"
        );
        records.push(record);
        write_json(&self.path, &records).await
    }

    /// All records, newest first
    pub async fn list(&self) -> Result<Vec<AssessmentRecord>, StoreError> {
        let mut records: Vec<AssessmentRecord> = read_json(&self.path).await?;
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(records)
    }

    /// Records for one student (case-insensitive), newest first
    pub async fn for_student(&self, name: &str) -> Result<Vec<AssessmentRecord>, StoreError> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.student_name.trim().to_lowercase() == name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn record(student: &str, minutes_ago: i64) -> AssessmentRecord {
        AssessmentRecord {
            id: Uuid::new_v4(),
            student_name: student.to_string(),
            grade: 6,
            topic_key: "solar-system".into(),
            topic_name: "The Solar System".into(),
            completed_at: Utc::now() - Duration::minutes(minutes_ago),
            question_count: 4,
            hints_used: 1,
            score_history: vec![60, 80, 91],
            final_difficulty: DifficultyLevel::Medium,
            assessment: Assessment::fallback(),
        }
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = JsonAssessmentStore::new(dir.path().join("assessments.json"));
        store.append(record("Ada", 30)).await.unwrap();
        store.append(record("Ada", 5)).await.unwrap();
        store.append(record("Ada", 60)).await.unwrap();

        let list = store.list().await.unwrap();
        assert_eq!(list.len(), 3);
        assert!(list[0].completed_at > list[1].completed_at);
        assert!(list[1].completed_at > list[2].completed_at);
    }

    #[tokio::test]
    async fn for_student_filters_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let store = JsonAssessmentStore::new(dir.path().join("assessments.json"));
        store.append(record("Ada", 1)).await.unwrap();
        store.append(record("Grace", 2)).await.unwrap();

        let ada = store.for_student("ada").await.unwrap();
        assert_eq!(ada.len(), 1);
        assert_eq!(ada[0].student_name, "Ada");
        assert!(store.for_student("Linus").await.unwrap().is_empty());
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(record("Ada", 0)).unwrap();
        assert!(json.get("studentName").is_some());
        assert_eq!(json["finalDifficulty"], "medium");
        assert!(json["assessment"].get("areasToImprove").is_some());
    }

    #[test]
    fn average_score() {
        assert_eq!(record("Ada", 0).average_score(), Some(77.0));
    }
}
