//! Typed error handling for catalog-core
//!
//! Errors are grouped by category so callers can react to a specific
//! failure instead of inspecting strings.
//!
//! # Error Categories
//!
//! - [`ValidationError`]: malformed client input (filters, sort, payloads)
//! - [`StorageError`]: failures reported by a [`RecordStore`](crate::storage::RecordStore)
//! - [`CatalogError::NotFound`]: a record identifier that does not resolve
//!
//! # Example
//!
//! ```rust,ignore
//! match service.toggle(id, actor, ToggleSide::A).await {
//!     Ok(record) => println!("likes: {:?}", record.get("likes")),
//!     Err(CatalogError::NotFound { id, .. }) => println!("no record {}", id),
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Result alias used throughout the crate
pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

/// The main error type for catalog-core
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Client input was rejected before reaching storage
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The record identifier does not resolve in the collection
    #[error("{collection} record with id '{id}' not found")]
    NotFound { collection: String, id: Uuid },

    /// The storage layer failed; surfaced unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CatalogError {
    /// Shorthand for a missing record
    pub fn not_found(collection: impl Into<String>, id: Uuid) -> Self {
        CatalogError::NotFound {
            collection: collection.into(),
            id,
        }
    }

    /// Get the error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::NotFound { .. } => "RECORD_NOT_FOUND",
            CatalogError::Storage(e) => e.error_code(),
        }
    }

    /// Whether this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::Validation(_) | CatalogError::NotFound { .. }
        )
    }

    /// Convert to a serializable error body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CatalogError::NotFound { collection, id } => Some(serde_json::json!({
                "collection": collection,
                "id": id.to_string()
            })),
            CatalogError::Validation(ValidationError::UnknownField { field })
            | CatalogError::Validation(ValidationError::UnknownSortField { field }) => {
                Some(serde_json::json!({ "field": field }))
            }
            _ => None,
        }
    }
}

/// Error body handed to whatever transport wraps the service
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required identifier or payload field is absent
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A value could not be read as the expected type
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Field is not in the collection's filterable allow-list
    #[error("Field '{field}' cannot be filtered")]
    UnknownField { field: String },

    /// Field is not in the collection's sortable allow-list
    #[error("Field '{field}' cannot be sorted")]
    UnknownSortField { field: String },

    /// Token could be reinterpreted as storage-layer control syntax
    #[error("Rejected token '{token}': not a plain field or operator name")]
    ControlSyntax { token: String },

    /// Projection mixes included and excluded fields
    #[error("Projection cannot mix included and excluded fields")]
    MixedProjection,
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        ValidationError::MissingField {
            field: field.into(),
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors related to storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// Query or update execution error
    #[error("{backend} query error: {message}")]
    QueryError { backend: String, message: String },

    /// A lock guarding in-process state was poisoned
    #[error("Storage lock poisoned: {message}")]
    LockPoisoned { message: String },

    /// Stored data violates an invariant this crate relies on
    #[error("Data integrity error: {message}")]
    IntegrityError { message: String },

    /// Record could not be converted to or from the backend representation
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn query(backend: impl Into<String>, message: impl ToString) -> Self {
        StorageError::QueryError {
            backend: backend.into(),
            message: message.to_string(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        StorageError::IntegrityError {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::QueryError { .. } => "STORAGE_QUERY_ERROR",
            StorageError::LockPoisoned { .. } => "STORAGE_ERROR",
            StorageError::IntegrityError { .. } => "STORAGE_INTEGRITY_ERROR",
            StorageError::Serialization(_) => "STORAGE_SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_code() {
        let err: CatalogError = ValidationError::missing("star").into();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Missing required field: star");
    }

    #[test]
    fn test_not_found_details() {
        let id = Uuid::new_v4();
        let err = CatalogError::not_found("products", id);
        let response = err.to_response();

        assert_eq!(response.code, "RECORD_NOT_FOUND");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "collection": "products", "id": id.to_string() }))
        );
    }

    #[test]
    fn test_storage_error_is_not_client_error() {
        let err: CatalogError = StorageError::query("memory", "disk on fire").into();
        assert!(!err.is_client_error());
        assert_eq!(err.error_code(), "STORAGE_QUERY_ERROR");
        assert_eq!(err.to_string(), "memory query error: disk on fire");
    }
}
