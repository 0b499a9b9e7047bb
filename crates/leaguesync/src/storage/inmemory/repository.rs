//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use leaguesync_core::record::{NaturalKey, SubjectId, SyncRecord, WritePolicy};
use leaguesync_core::storage::{Repository, RepositoryError, Result, SubjectDirectory};

/// In-memory storage backend for testing.
///
/// Rows are stored as JSON values keyed by (kind, natural key), so one
/// instance serves every entity kind just like the SQLite backend. Data is
/// lost when the repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    rows: Arc<RwLock<HashMap<(String, NaturalKey), serde_json::Value>>>,
    subjects: Arc<RwLock<BTreeMap<SubjectId, Option<String>>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_value<T: SyncRecord>(record: &T) -> Result<serde_json::Value> {
    serde_json::to_value(record).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn from_value<T: SyncRecord>(value: &serde_json::Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl<T: SyncRecord> Repository<T> for InMemoryRepository {
    async fn find_existing(&self, key: &NaturalKey) -> Result<Option<T>> {
        let rows = self.rows.read().await;
        rows.get(&(T::KIND.to_string(), key.clone()))
            .map(from_value)
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        let rows = self.rows.read().await;
        rows.iter()
            .filter(|((kind, _), _)| kind == T::KIND)
            .map(|(_, value)| from_value(value))
            .collect()
    }

    async fn find_by_subject(&self, subject: SubjectId) -> Result<Vec<T>> {
        let rows = self.rows.read().await;
        rows.iter()
            .filter(|((kind, key), _)| kind == T::KIND && key.subject == subject)
            .map(|(_, value)| from_value(value))
            .collect()
    }

    async fn batch_upsert(&self, records: &[T]) -> Result<usize> {
        let mut rows = self.rows.write().await;
        let mut written = 0;
        for record in records {
            let key = (T::KIND.to_string(), record.natural_key());
            match T::WRITE_POLICY {
                WritePolicy::SkipIfExists => {
                    if !rows.contains_key(&key) {
                        rows.insert(key, to_value(record)?);
                        written += 1;
                    }
                }
                WritePolicy::Overwrite => {
                    rows.insert(key, to_value(record)?);
                    written += 1;
                }
            }
        }
        Ok(written)
    }

    async fn delete_all(&self) -> Result<usize> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(kind, _), _| kind != T::KIND);
        Ok(before - rows.len())
    }

    async fn delete_by_subject(&self, subject: SubjectId) -> Result<usize> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(kind, key), _| kind != T::KIND || key.subject != subject);
        Ok(before - rows.len())
    }
}

#[async_trait]
impl SubjectDirectory for InMemoryRepository {
    async fn list_subjects(&self) -> Result<Vec<SubjectId>> {
        Ok(self.subjects.read().await.keys().copied().collect())
    }

    async fn register_subject(&self, subject: SubjectId, label: Option<&str>) -> Result<()> {
        self.subjects
            .write()
            .await
            .insert(subject, label.map(str::to_string));
        Ok(())
    }

    async fn deregister_subject(&self, subject: SubjectId) -> Result<()> {
        self.subjects.write().await.remove(&subject);
        Ok(())
    }
}
