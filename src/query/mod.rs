//! Listing: client parameters to filter, sort, projection and page window

pub mod filter;
pub mod page;
pub mod params;
pub mod plan;
pub mod projection;
pub mod sort;
pub mod translator;

pub use filter::{Comparator, Condition, FieldPredicate, Filter, TextPattern};
pub use page::{Page, PageWindow, PaginationMeta};
pub use params::{ParamValue, QueryParams, RESERVED_PARAMS};
pub use plan::QueryPlan;
pub use projection::Projection;
pub use sort::{SortDirection, SortKey, SortSpec};
pub use translator::FilterTranslator;
