//! Macro-generated test suite for `RecordStore` contract validation.
//!
//! The `record_store_tests!` macro generates a test module that validates any
//! `RecordStore` implementation against the contract the query and mutation
//! layers rely on: filtering, ordering, windowing, counting, projection and
//! single-record patches.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use catalog::storage::InMemoryRecordStore;
//!
//! record_store_tests!(InMemoryRecordStore::new());
//! ```
//!
//! # Generated Tests
//!
//! ## Reads
//! - `test_insert_and_find_by_id`: insert then retrieve, version starts at 0
//! - `test_find_by_id_missing`: random UUID returns None
//! - `test_find_comparison_range`: `gte`/`lte` on the same field, sorted descending
//! - `test_find_window`: skip/limit over a sorted listing
//! - `test_count_ignores_window`: count matches the filter, not the page
//! - `test_text_search_case_insensitive`: substring match ignores case
//! - `test_equality_matches_numeric_literal`: `"30"` matches a stored 30
//! - `test_projection_include` / `test_default_projection_hides_version`
//!
//! ## Writes
//! - `test_push_then_pull`: list membership edits, version bumps
//! - `test_update_missing_returns_none`
//! - `test_positional_update`: only the element matched by the filter changes
//! - `test_update_one_matching_without_match`
//! - `test_concurrent_inserts`: parallel inserts from spawned tasks

/// Generate a full `RecordStore` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty store implementing
/// `RecordStore + Clone + 'static`. It is re-evaluated for each test.
#[macro_export]
macro_rules! record_store_tests {
    ($factory:expr) => {
        mod record_store_contract_tests {
            use super::*;
            use catalog::prelude::*;
            use catalog::query::filter::TextPattern;

            async fn seeded() -> impl RecordStore + Clone + 'static {
                let store = $factory;
                for product in sample_catalogue() {
                    store.insert(product).await.unwrap();
                }
                store
            }

            fn hidden() -> Projection {
                Projection::parse(None, "__v").unwrap()
            }

            // ==================================================================
            // Reads
            // ==================================================================

            #[tokio::test]
            async fn test_insert_and_find_by_id() {
                let store = $factory;
                let product = create_product("Pixel", 700, "Google");
                let id = product.id;

                let stored = store.insert(product).await.unwrap();
                assert_eq!(stored.id, id);
                assert_eq!(stored.version(), 0);

                let fetched = store.find_by_id(&id).await.unwrap().expect("record should exist");
                assert_eq!(fetched.get("title"), Some(&json!("Pixel")));
                assert_eq!(fetched.get("price").and_then(Value::as_i64), Some(700));
                assert!(fetched.get("createdAt").is_some());
            }

            #[tokio::test]
            async fn test_find_by_id_missing() {
                let store = $factory;
                assert!(store.find_by_id(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_find_comparison_range() {
                let store = seeded().await;
                let filter = Filter::new()
                    .and("price", Condition::Compare(Comparator::Gte, 50.0))
                    .and("price", Condition::Compare(Comparator::Lte, 80.0));
                let sort = SortSpec::parse("-price").unwrap();

                let found = store.find(&filter, &sort, &hidden(), 0, 10).await.unwrap();
                assert_eq!(prices(&found), vec![80, 70, 60, 50]);
            }

            #[tokio::test]
            async fn test_find_window() {
                let store = seeded().await;
                let sort = SortSpec::parse("price").unwrap();

                let found = store.find(&Filter::new(), &sort, &hidden(), 2, 3).await.unwrap();
                assert_eq!(prices(&found), vec![30, 40, 50]);
            }

            #[tokio::test]
            async fn test_count_ignores_window() {
                let store = seeded().await;
                let filter = Filter::new().and("brand", Condition::Equals("Apple".into()));

                let found = store
                    .find(&filter, &SortSpec::natural(), &hidden(), 0, 2)
                    .await
                    .unwrap();
                assert_count(&found, 2);
                assert_eq!(store.count_matching(&filter).await.unwrap(), 5);
                assert_eq!(store.count_matching(&Filter::new()).await.unwrap(), 10);
            }

            #[tokio::test]
            async fn test_text_search_case_insensitive() {
                let store = seeded().await;
                let pattern = TextPattern::new("title", "PHONE 1").unwrap();
                let filter = Filter::new().and("title", Condition::Contains(pattern));
                let sort = SortSpec::parse("price").unwrap();

                let found = store.find(&filter, &sort, &hidden(), 0, 10).await.unwrap();
                assert_eq!(titles(&found), vec!["Phone 1", "Phone 10"]);
            }

            #[tokio::test]
            async fn test_equality_matches_numeric_literal() {
                let store = seeded().await;
                let filter = Filter::new().and("price", Condition::Equals("30".into()));

                let found = store
                    .find(&filter, &SortSpec::natural(), &hidden(), 0, 10)
                    .await
                    .unwrap();
                assert_eq!(titles(&found), vec!["Phone 3"]);
            }

            #[tokio::test]
            async fn test_projection_include() {
                let store = seeded().await;
                let projection = Projection::parse(Some("title"), "__v").unwrap();

                let found = store
                    .find(&Filter::new(), &SortSpec::natural(), &projection, 0, 3)
                    .await
                    .unwrap();
                assert_count(&found, 3);
                for record in &found {
                    assert!(record.get("title").is_some());
                    assert!(record.get("price").is_none());
                    assert!(record.get("__v").is_none());
                }
            }

            #[tokio::test]
            async fn test_default_projection_hides_version() {
                let store = seeded().await;
                let found = store
                    .find(&Filter::new(), &SortSpec::natural(), &hidden(), 0, 10)
                    .await
                    .unwrap();
                assert!(found.iter().all(|r| r.get("__v").is_none()));
                assert!(found.iter().all(|r| r.get("brand").is_some()));
            }

            // ==================================================================
            // Writes
            // ==================================================================

            #[tokio::test]
            async fn test_push_then_pull() {
                let store = $factory;
                let blog = store.insert(create_blog("Rust")).await.unwrap();

                let liked = store
                    .update_by_id(&blog.id, &Patch::push("likes", "u1"))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(liked.get("likes"), Some(&json!(["u1"])));
                assert_eq!(liked.version(), 1);

                let unliked = store
                    .update_by_id(&blog.id, &Patch::pull("likes", "u1"))
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(unliked.get("likes"), Some(&json!([])));
                assert_eq!(unliked.version(), 2);
            }

            #[tokio::test]
            async fn test_update_missing_returns_none() {
                let store = $factory;
                let result = store
                    .update_by_id(&Uuid::new_v4(), &Patch::set("title", "x"))
                    .await
                    .unwrap();
                assert!(result.is_none());
            }

            #[tokio::test]
            async fn test_positional_update() {
                let store = $factory;
                let user = create_user("ana").with(
                    "cart",
                    json!([
                        { "product": "p1", "color": "Red", "quantity": 1 },
                        { "product": "p1", "color": "Blue", "quantity": 2 }
                    ]),
                );
                let user = store.insert(user).await.unwrap();

                let mut criteria = Map::new();
                criteria.insert("product".into(), json!("p1"));
                criteria.insert("color".into(), json!("Blue"));
                let filter = Filter::by_id(user.id).and("cart", Condition::ElementMatch(criteria));

                let mut fields = Map::new();
                fields.insert("quantity".into(), json!(7));
                let updated = store
                    .update_one_matching(&filter, &Patch::set_matched("cart", fields))
                    .await
                    .unwrap()
                    .unwrap();

                let cart = updated.list("cart").unwrap();
                assert_eq!(cart[0]["quantity"], json!(1));
                assert_eq!(cart[1]["quantity"], json!(7));
                assert_eq!(cart[1]["color"], json!("Blue"));
            }

            #[tokio::test]
            async fn test_update_one_matching_without_match() {
                let store = $factory;
                let user = store.insert(create_user("ana")).await.unwrap();

                let mut criteria = Map::new();
                criteria.insert("product".into(), json!("missing"));
                let filter = Filter::by_id(user.id).and("cart", Condition::ElementMatch(criteria));

                let result = store
                    .update_one_matching(&filter, &Patch::set_matched("cart", Map::new()))
                    .await
                    .unwrap();
                assert!(result.is_none());
            }

            #[tokio::test]
            async fn test_concurrent_inserts() {
                let store = $factory;
                let mut handles = Vec::new();
                for i in 0..10 {
                    let store = store.clone();
                    handles.push(tokio::spawn(async move {
                        store
                            .insert(create_product(&format!("Concurrent {}", i), i, "Acme"))
                            .await
                            .unwrap()
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }

                assert_eq!(store.count_matching(&Filter::new()).await.unwrap(), 10);
            }
        }
    };
}
