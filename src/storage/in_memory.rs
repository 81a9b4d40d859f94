//! In-memory implementation of RecordStore for testing and development

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::core::error::StorageError;
use crate::core::record::{Record, VERSION_FIELD};
use crate::query::filter::Filter;
use crate::query::projection::Projection;
use crate::query::sort::SortSpec;
use crate::storage::{Patch, RecordStore};

/// In-memory record store
///
/// Records keep insertion order, which is the natural order for unsorted
/// listings. Every write bumps `__v` and stamps `updatedAt`. Uses RwLock for
/// thread-safe access; a lock is held only within one call.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<IndexMap<Uuid, Record>>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, IndexMap<Uuid, Record>>, StorageError> {
        self.records.read().map_err(|e| StorageError::LockPoisoned {
            message: format!("Failed to acquire read lock: {}", e),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, IndexMap<Uuid, Record>>, StorageError> {
        self.records.write().map_err(|e| StorageError::LockPoisoned {
            message: format!("Failed to acquire write lock: {}", e),
        })
    }

    /// Apply to a copy, then swap it in
    fn commit(
        stored: &mut Record,
        patch: &Patch,
        matched_by: Option<&Filter>,
    ) -> Result<Record, StorageError> {
        let mut next = stored.clone();
        patch.apply_to(&mut next, matched_by)?;
        let version = next.version() + 1;
        next.set(VERSION_FIELD, version);
        next.set("updatedAt", Utc::now().to_rfc3339());
        *stored = next.clone();
        Ok(next)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        projection: &Projection,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Record>, StorageError> {
        let mut matching: Vec<Record> = {
            let records = self.read()?;
            records
                .values()
                .filter(|record| filter.matches(record))
                .cloned()
                .collect()
        };

        sort.sort(&mut matching);

        Ok(matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|record| projection.apply(record))
            .collect())
    }

    async fn count_matching(&self, filter: &Filter) -> Result<u64, StorageError> {
        let records = self.read()?;
        Ok(records.values().filter(|record| filter.matches(record)).count() as u64)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Record>, StorageError> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn update_by_id(&self, id: &Uuid, patch: &Patch) -> Result<Option<Record>, StorageError> {
        let mut records = self.write()?;
        match records.get_mut(id) {
            Some(stored) => Self::commit(stored, patch, None).map(Some),
            None => Ok(None),
        }
    }

    async fn update_one_matching(
        &self,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Option<Record>, StorageError> {
        let mut records = self.write()?;
        match records.values_mut().find(|record| filter.matches(record)) {
            Some(stored) => Self::commit(stored, patch, Some(filter)).map(Some),
            None => Ok(None),
        }
    }

    async fn insert(&self, mut record: Record) -> Result<Record, StorageError> {
        let mut records = self.write()?;
        if records.contains_key(&record.id) {
            return Err(StorageError::integrity(format!(
                "record '{}' already exists",
                record.id
            )));
        }

        let now = Utc::now().to_rfc3339();
        record.set(VERSION_FIELD, 0);
        if record.get("createdAt").is_none() {
            record.set("createdAt", now.clone());
        }
        record.set("updatedAt", now);

        records.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::Condition;
    use serde_json::json;

    fn default_projection() -> Projection {
        Projection::Default {
            hidden: VERSION_FIELD.to_string(),
        }
    }

    async fn seeded() -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        for (title, price) in [("a", 3), ("b", 1), ("c", 2)] {
            store
                .insert(Record::new(Uuid::new_v4()).with("title", title).with("price", price))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_sets_version() {
        let store = InMemoryRecordStore::new();
        let record = store.insert(Record::new(Uuid::new_v4())).await.unwrap();
        assert_eq!(record.version(), 0);
        assert!(record.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryRecordStore::new();
        let record = Record::new(Uuid::new_v4());
        store.insert(record.clone()).await.unwrap();
        assert!(store.insert(record).await.is_err());
    }

    #[tokio::test]
    async fn test_find_natural_order_and_window() {
        let store = seeded().await;
        let page = store
            .find(&Filter::new(), &SortSpec::natural(), &default_projection(), 1, 5)
            .await
            .unwrap();

        let titles: Vec<&str> = page.iter().map(|r| r.get("title").unwrap().as_str().unwrap()).collect();
        assert_eq!(titles, vec!["b", "c"]);
        assert!(page[0].get("__v").is_none());
    }

    #[tokio::test]
    async fn test_find_sorted() {
        let store = seeded().await;
        let sort = SortSpec::parse("-price").unwrap();
        let page = store
            .find(&Filter::new(), &sort, &default_projection(), 0, 10)
            .await
            .unwrap();

        let prices: Vec<i64> = page.iter().map(|r| r.get("price").unwrap().as_i64().unwrap()).collect();
        assert_eq!(prices, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_count_ignores_window() {
        let store = seeded().await;
        let filter = Filter::new().and("price", Condition::Equals("1".into()));
        assert_eq!(store.count_matching(&filter).await.unwrap(), 1);
        assert_eq!(store.count_matching(&Filter::new()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryRecordStore::new();
        let record = store.insert(Record::new(Uuid::new_v4())).await.unwrap();

        let updated = store
            .update_by_id(&record.id, &Patch::push("likes", "u1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.version(), 1);
        assert_eq!(updated.get("likes"), Some(&json!(["u1"])));
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = InMemoryRecordStore::new();
        let result = store
            .update_by_id(&Uuid::new_v4(), &Patch::set("title", "x"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_failed_patch_leaves_record_untouched() {
        let store = InMemoryRecordStore::new();
        let record = store
            .insert(Record::new(Uuid::new_v4()).with("likes", 5))
            .await
            .unwrap();

        let patch = Patch::set("title", "x").and(crate::storage::FieldUpdate::Push {
            field: "likes".into(),
            value: json!("u1"),
        });
        assert!(store.update_by_id(&record.id, &patch).await.is_err());

        let stored = store.find_by_id(&record.id).await.unwrap().unwrap();
        assert!(stored.get("title").is_none());
        assert_eq!(stored.version(), 0);
    }
}
