//! # Catalog Core
//!
//! Dynamic listing queries and idempotent list mutations over a document
//! collection.
//!
//! ## Features
//!
//! - **Query Translation**: `price[gte]=100&title=phone` becomes a typed filter with allow-listed fields
//! - **Pagination**: Sort, projection and page window with total counts
//! - **Toggle Sets**: Mutually exclusive membership lists (likes / dislikes)
//! - **Keyed Upserts**: Update-or-append list entries (cart lines, ratings)
//! - **Aggregates**: Rounded mean recomputed after every rating
//! - **Configuration-Based**: Collections and paging defined via YAML
//! - **Pluggable Storage**: In-memory store built in, MongoDB behind a feature flag
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog::prelude::*;
//!
//! let store = Arc::new(InMemoryRecordStore::new());
//! let service = CatalogService::new(store, CollectionConfig::products(), PagingConfig::default());
//!
//! let page = service
//!     .list(&QueryParams::from_query_string("price[gte]=100&sort=-price&page=1&limit=10"))
//!     .await?;
//!
//! service.toggle(blog_id, user_id, ToggleSide::A).await?;
//! service.update_cart(user_id, CartLine::new(product_id, "Red", 3)).await?;
//! service.rate(product_id, RatingInput::new(user_id, 5)).await?;
//! ```

pub mod config;
pub mod core;
pub mod mutation;
pub mod query;
pub mod service;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        CatalogError, ErrorResponse, Record, StorageError, ValidationError,
    };

    // === Query ===
    pub use crate::query::{
        Comparator, Condition, Filter, FilterTranslator, Page, PageWindow, PaginationMeta,
        Projection, QueryParams, QueryPlan, SortSpec,
    };

    // === Mutation ===
    pub use crate::mutation::{
        AggregateRecomputation, EntryKey, KeyedUpsertList, Membership, ToggleSet, ToggleSide,
        UpsertOutcome,
    };

    // === Service ===
    pub use crate::service::{CartLine, CatalogService, RatingInput};

    // === Storage ===
    pub use crate::storage::{FieldUpdate, InMemoryRecordStore, Patch, RecordStore};
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoRecordStore;

    // === Config ===
    pub use crate::config::{CatalogConfig, CollectionConfig, PagingConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::{Map, Value, json};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
