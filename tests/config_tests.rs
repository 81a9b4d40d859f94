//! Integration tests for configuration loading

use catalog::prelude::*;
use std::io::Write;

const SHOP_YAML: &str = r#"
paging:
  default_limit: 5
  max_limit: 50

collections:
  products:
    name: products
    filterable_fields: [title, price, brand]
    sortable_fields: [price]
  blogs:
    name: blogs
    filterable_fields: [title, category]
    sortable_fields: [title]
    text_search_fields: [title, category]
"#;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SHOP_YAML.as_bytes()).unwrap();

    let config = CatalogConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.paging.default_limit, 5);
    assert_eq!(config.paging.max_limit, 50);

    let blogs = config.collection("blogs").unwrap();
    assert!(blogs.is_text_search("category"));
    assert!(!blogs.is_sortable("category"));
}

#[test]
fn test_missing_file_reports_path() {
    let err = CatalogConfig::from_yaml_file("/nonexistent/catalog.yaml").unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/catalog.yaml"));
}

#[test]
fn test_malformed_yaml_rejected() {
    assert!(CatalogConfig::from_yaml_str("paging: [1, 2").is_err());
}

#[tokio::test]
async fn test_loaded_config_drives_listing() {
    let config = CatalogConfig::from_yaml_str(SHOP_YAML).unwrap();
    let products = config.collection("products").unwrap().clone();
    let service = CatalogService::new(Arc::new(InMemoryRecordStore::new()), products, config.paging);

    for i in 0..12 {
        service
            .insert(Record::new(Uuid::new_v4()).with("title", format!("p{}", i)).with("price", i))
            .await
            .unwrap();
    }

    let page = service.list(&QueryParams::new()).await.unwrap();
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.pagination.total_pages, 3);

    // `slug` is not filterable in this configuration
    let err = service
        .list(&QueryParams::from_query_string("slug=p1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::UnknownField { .. })
    ));
}
