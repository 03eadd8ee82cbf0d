//! Local JSON-file curriculum collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::{CurriculumItem, CurriculumSource};
use crate::error::StoreError;
use crate::storage::{read_json, write_json};

/// Curriculum items kept in a single JSON array on disk.
///
/// Items are addressed by full UUID or by any unique prefix of it.
pub struct JsonCurriculumStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCurriculumStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store at the default data location.
    pub fn open_default() -> Self {
        Self::new(tutor_paths::curriculum_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All items, oldest first.
    pub async fn list(&self) -> Result<Vec<CurriculumItem>, StoreError> {
        let mut items: Vec<CurriculumItem> = read_json(&self.path).await?;
        items.sort_by_key(|i| i.created_at);
        Ok(items)
    }

    pub async fn add(&self, item: CurriculumItem) -> Result<CurriculumItem, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<CurriculumItem> = read_json(&self.path).await?;
        items.push(item.clone());
        write_json(&self.path, &items).await?;

        info!(id = %item.id, title = %item.title, "added curriculum item");
        Ok(item)
    }

    /// Look up one item by id or id prefix.
    pub async fn get(&self, id: &str) -> Result<CurriculumItem, StoreError> {
        let items: Vec<CurriculumItem> = read_json(&self.path).await?;
        let index = resolve(&items, id)?;
        Ok(items[index].clone())
    }

    /// Enable or disable an item. Returns the updated item.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<CurriculumItem, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<CurriculumItem> = read_json(&self.path).await?;
        let index = resolve(&items, id)?;
        items[index].is_active = active;
        write_json(&self.path, &items).await?;

        info!(id = %items[index].id, active, "updated curriculum item");
        Ok(items[index].clone())
    }

    /// Delete an item. Returns what was removed.
    pub async fn remove(&self, id: &str) -> Result<CurriculumItem, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut items: Vec<CurriculumItem> = read_json(&self.path).await?;
        let index = resolve(&items, id)?;
        let removed = items.remove(index);
        write_json(&self.path, &items).await?;

        info!(id = %removed.id, "removed curriculum item");
        Ok(removed)
    }
}

fn resolve(items: &[CurriculumItem], id: &str) -> Result<usize, StoreError> {
    let needle = id.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Err(StoreError::NotFound(id.to_string()));
    }

    if let Ok(uuid) = Uuid::parse_str(&needle)
        && let Some(index) = items.iter().position(|i| i.id == uuid)
    {
        return Ok(index);
    }

    let mut matches = items
        .iter()
        .enumerate()
        .filter(|(_, i)| i.id.to_string().starts_with(&needle));

    match (matches.next(), matches.next()) {
        (Some((index, _)), None) => Ok(index),
        (Some(_), Some(_)) => Err(StoreError::Ambiguous(id.to_string())),
        (None, _) => Err(StoreError::NotFound(id.to_string())),
    }
}

#[async_trait]
impl CurriculumSource for JsonCurriculumStore {
    async fn items_for(
        &self,
        topic_key: &str,
        grade: u8,
    ) -> Result<Vec<CurriculumItem>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|i| i.applies_to(topic_key, grade))
            .collect())
    }
}
