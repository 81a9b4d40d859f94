//! Core types shared by the query and mutation modules

pub mod error;
pub mod record;

pub use error::{CatalogError, ErrorResponse, Result, StorageError, ValidationError};
pub use record::{ID_FIELD, Record, VERSION_FIELD};
