//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::record::{ID_FIELD, VERSION_FIELD};

/// Environment variable overriding the default page size
pub const ENV_DEFAULT_LIMIT: &str = "CATALOG_DEFAULT_LIMIT";

/// Environment variable overriding the maximum page size
pub const ENV_MAX_LIMIT: &str = "CATALOG_MAX_LIMIT";

/// Legacy page-size variable, honoured when `CATALOG_DEFAULT_LIMIT` is unset
pub const ENV_LEGACY_LIMIT: &str = "LIMIT_PRODUCTS";

/// Page size settings shared by every collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Items per page when the client sends no `limit`
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Upper bound on any requested `limit`
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
}

fn default_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

/// Per-collection query surface
///
/// Only the fields named here may appear in client filters or sort
/// expressions; anything else is rejected before a predicate is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection name (e.g., "products")
    pub name: String,

    /// Fields accepted as filter keys
    #[serde(default)]
    pub filterable_fields: Vec<String>,

    /// Fields accepted in `sort`; `id` is always sortable
    #[serde(default)]
    pub sortable_fields: Vec<String>,

    /// Fields matched as case-insensitive substrings instead of equality
    #[serde(default = "default_text_search_fields")]
    pub text_search_fields: Vec<String>,

    /// Internal field hidden from default projections
    #[serde(default = "default_reserved_field")]
    pub reserved_field: String,
}

fn default_text_search_fields() -> Vec<String> {
    vec!["title".to_string()]
}

fn default_reserved_field() -> String {
    VERSION_FIELD.to_string()
}

impl CollectionConfig {
    /// Create a collection with no filterable or sortable fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filterable_fields: Vec::new(),
            sortable_fields: Vec::new(),
            text_search_fields: default_text_search_fields(),
            reserved_field: default_reserved_field(),
        }
    }

    pub fn with_filterable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_sortable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_text_search<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_filterable(&self, field: &str) -> bool {
        self.filterable_fields.iter().any(|f| f == field)
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        field == ID_FIELD || self.sortable_fields.iter().any(|f| f == field)
    }

    pub fn is_text_search(&self, field: &str) -> bool {
        self.text_search_fields.iter().any(|f| f == field)
    }

    /// Query surface of the product catalogue
    pub fn products() -> Self {
        let scalar = [
            "title",
            "slug",
            "brand",
            "price",
            "category",
            "quantity",
            "sold",
            "color",
            "totalRatings",
        ];
        Self::new("products")
            .with_filterable(scalar)
            .with_sortable(scalar.into_iter().chain(["createdAt", "updatedAt"]))
    }

    /// Query surface of blog posts
    pub fn blogs() -> Self {
        Self::new("blogs")
            .with_filterable(["title", "category", "author", "numberViews"])
            .with_sortable(["title", "category", "numberViews", "createdAt"])
    }
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub paging: PagingConfig,

    /// Collections keyed by name
    #[serde(default)]
    pub collections: HashMap<String, CollectionConfig>,
}

impl CatalogConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply page-size overrides from the process environment
    pub fn from_env_overrides(mut self) -> Result<Self> {
        let default_limit = std::env::var(ENV_DEFAULT_LIMIT)
            .ok()
            .or_else(|| std::env::var(ENV_LEGACY_LIMIT).ok());

        if let Some(raw) = default_limit {
            self.paging.default_limit = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid default page size '{}'", raw))?;
        }
        if let Ok(raw) = std::env::var(ENV_MAX_LIMIT) {
            self.paging.max_limit = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid maximum page size '{}'", raw))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Look up a collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.get(name)
    }

    fn validate(&self) -> Result<()> {
        if self.paging.default_limit == 0 || self.paging.max_limit == 0 {
            anyhow::bail!("page sizes must be at least 1");
        }
        if self.paging.default_limit > self.paging.max_limit {
            anyhow::bail!(
                "default_limit ({}) exceeds max_limit ({})",
                self.paging.default_limit,
                self.paging.max_limit
            );
        }
        for (key, collection) in &self.collections {
            if key != &collection.name {
                anyhow::bail!(
                    "collection key '{}' does not match its name '{}'",
                    key,
                    collection.name
                );
            }
        }
        Ok(())
    }

    /// Create a default configuration with the products and blogs collections
    pub fn default_config() -> Self {
        let collections = [CollectionConfig::products(), CollectionConfig::blogs()]
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        Self {
            paging: PagingConfig::default(),
            collections,
        }
    }
}
