//! Shared test harness for storage backend testing
//!
//! Provides product, blog and user record builders, a seeded product
//! catalogue, and the `record_store_tests!` conformance suite.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod record_store_tests;

use std::sync::Arc;
use uuid::Uuid;

use catalog::prelude::*;

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

/// A product with the fields listings filter and sort on
pub fn create_product(title: &str, price: i64, brand: &str) -> Record {
    Record::new(Uuid::new_v4())
        .with("title", title)
        .with("slug", title.to_lowercase().replace(' ', "-"))
        .with("price", price)
        .with("brand", brand)
        .with("category", "phones")
        .with("quantity", 10)
        .with("ratings", json!([]))
        .with("totalRatings", 0.0)
}

pub fn create_blog(title: &str) -> Record {
    Record::new(Uuid::new_v4())
        .with("title", title)
        .with("likes", json!([]))
        .with("dislikes", json!([]))
}

pub fn create_user(name: &str) -> Record {
    Record::new(Uuid::new_v4())
        .with("name", name)
        .with("cart", json!([]))
}

/// Ten products priced 10, 20, ... 100, alternating two brands
pub fn sample_catalogue() -> Vec<Record> {
    (1..=10)
        .map(|i| {
            let brand = if i % 2 == 0 { "Apple" } else { "Samsung" };
            create_product(&format!("Phone {}", i), i * 10, brand)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

pub fn product_service(store: Arc<dyn RecordStore>) -> CatalogService {
    CatalogService::new(store, CollectionConfig::products(), PagingConfig::default())
}

pub fn blog_service(store: Arc<dyn RecordStore>) -> CatalogService {
    CatalogService::new(store, CollectionConfig::blogs(), PagingConfig::default())
}

pub fn user_service(store: Arc<dyn RecordStore>) -> CatalogService {
    CatalogService::new(store, CollectionConfig::new("users"), PagingConfig::default())
}

/// An in-memory product service holding `sample_catalogue()`
pub async fn seeded_product_service() -> CatalogService {
    let service = product_service(Arc::new(InMemoryRecordStore::new()));
    for product in sample_catalogue() {
        service.insert(product).await.unwrap();
    }
    service
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

pub fn titles(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("title").and_then(Value::as_str).map(str::to_string))
        .collect()
}

pub fn prices(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.get("price").and_then(Value::as_i64))
        .collect()
}

pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}
