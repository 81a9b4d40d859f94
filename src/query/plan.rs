//! Executable listing plan
//!
//! A [`QueryPlan`] bundles filter, sort, projection and page window.
//! `fetch` and `count` are independent storage reads with no shared
//! snapshot: a write landing between them can make the total disagree with
//! the page contents. Callers get both numbers as read.

use crate::config::{CollectionConfig, PagingConfig};
use crate::core::error::{Result, ValidationError};
use crate::core::record::Record;
use crate::query::filter::Filter;
use crate::query::page::{Page, PageWindow, PaginationMeta};
use crate::query::params::QueryParams;
use crate::query::projection::Projection;
use crate::query::sort::SortSpec;
use crate::query::translator::FilterTranslator;
use crate::storage::RecordStore;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub filter: Filter,
    pub sort: SortSpec,
    pub projection: Projection,
    pub window: PageWindow,
}

impl QueryPlan {
    /// Compose a plan from its parts
    pub fn build(filter: Filter, sort: SortSpec, projection: Projection, window: PageWindow) -> Self {
        Self {
            filter,
            sort,
            projection,
            window,
        }
    }

    /// Compile client parameters for `collection`
    pub fn compile(
        params: &QueryParams,
        collection: &CollectionConfig,
        paging: &PagingConfig,
    ) -> Result<Self, ValidationError> {
        let filter = FilterTranslator::new(collection).translate(params)?;

        let sort = match params.single("sort") {
            Some(raw) => SortSpec::parse(raw)?,
            None => SortSpec::natural(),
        };
        sort.ensure_allowed(collection)?;

        let projection = Projection::parse(params.single("fields"), &collection.reserved_field)?;
        let window = PageWindow::from_params(params.single("page"), params.single("limit"), paging)?;

        Ok(Self::build(filter, sort, projection, window))
    }

    /// Read the page; never more than `limit` records
    pub async fn fetch(&self, store: &dyn RecordStore) -> Result<Vec<Record>> {
        let mut items = store
            .find(
                &self.filter,
                &self.sort,
                &self.projection,
                self.window.offset(),
                self.window.limit(),
            )
            .await?;

        if items.len() > self.window.limit() {
            tracing::warn!(
                returned = items.len(),
                limit = self.window.limit(),
                "storage returned more records than requested, truncating"
            );
            items.truncate(self.window.limit());
        }
        Ok(items)
    }

    /// Count every record matching the filter, ignoring the window
    pub async fn count(&self, store: &dyn RecordStore) -> Result<u64> {
        Ok(store.count_matching(&self.filter).await?)
    }

    /// Fetch, then count
    pub async fn execute(&self, store: &dyn RecordStore) -> Result<Page> {
        let items = self.fetch(store).await?;
        let total_count = self.count(store).await?;

        tracing::debug!(
            page = self.window.page(),
            limit = self.window.limit(),
            returned = items.len(),
            total = total_count,
            "listing executed"
        );

        Ok(Page {
            items,
            total_count,
            pagination: PaginationMeta::new(self.window, total_count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::{Comparator, Condition};
    use crate::query::sort::SortDirection;

    #[test]
    fn test_compile_routes_reserved_params() {
        let params = QueryParams::from_query_string(
            "price[gt]=10&sort=-price,title&fields=title,price&page=2&limit=5",
        );
        let plan = QueryPlan::compile(
            &params,
            &CollectionConfig::products(),
            &PagingConfig::default(),
        )
        .unwrap();

        assert_eq!(plan.filter.predicates().len(), 1);
        assert_eq!(
            plan.filter.predicates()[0].condition,
            Condition::Compare(Comparator::Gt, 10.0)
        );
        assert_eq!(plan.sort.keys()[0].direction, SortDirection::Desc);
        assert_eq!(
            plan.projection,
            Projection::Include(vec!["title".into(), "price".into()])
        );
        assert_eq!(plan.window.offset(), 5);
    }

    #[test]
    fn test_compile_rejects_unsortable() {
        let params = QueryParams::new().with("sort", "password");
        let err = QueryPlan::compile(
            &params,
            &CollectionConfig::products(),
            &PagingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSortField { .. }));
    }
}
