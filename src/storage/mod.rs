//! Storage implementations for different backends
//!
//! Everything above this module talks to a collection through
//! [`RecordStore`]; the query and mutation modules never see a backend's
//! native syntax.

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;
pub mod patch;

pub use in_memory::InMemoryRecordStore;
#[cfg(feature = "mongodb_backend")]
pub use mongodb::MongoRecordStore;
pub use patch::{FieldUpdate, Patch};

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::StorageError;
use crate::core::record::Record;
use crate::query::filter::Filter;
use crate::query::projection::Projection;
use crate::query::sort::SortSpec;

/// A document collection
///
/// Each call is an independent operation; no snapshot is shared between
/// calls. Updates return the record as stored afterwards, or `None` when
/// nothing matched.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records matching `filter`, ordered by `sort`, shaped by
    /// `projection`, skipping `skip` and returning at most `limit`
    async fn find(
        &self,
        filter: &Filter,
        sort: &SortSpec,
        projection: &Projection,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<Record>, StorageError>;

    /// Number of records matching `filter`
    async fn count_matching(&self, filter: &Filter) -> Result<u64, StorageError>;

    /// Fetch a full record by identifier
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Record>, StorageError>;

    /// Apply `patch` to the record with this identifier
    async fn update_by_id(&self, id: &Uuid, patch: &Patch) -> Result<Option<Record>, StorageError>;

    /// Apply `patch` to the first record matching `filter`
    ///
    /// Positional updates resolve against the filter's element-match
    /// predicate.
    async fn update_one_matching(
        &self,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<Option<Record>, StorageError>;

    /// Store a new record as given
    async fn insert(&self, record: Record) -> Result<Record, StorageError>;
}
