//! Error types for catalog operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity_type} with id {id} not found")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Document serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Storage operation '{operation}' timed out")]
    Timeout { operation: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    RequiredFieldMissing { field: String },

    #[error("{field} {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("wrong id format")]
    InvalidId { value: String },
}

/// Entity cache errors.
///
/// `KeyNotFound` is the only domain outcome. `Unavailable` covers cache
/// backends that can fail for infrastructure reasons.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("key {key} not found in cache")]
    KeyNotFound { key: String },

    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all catalog errors.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl CatalogError {
    /// True for "no such entity" outcomes, from either the store or the cache.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::Storage(StorageError::NotFound { .. })
                | CatalogError::Cache(CacheError::KeyNotFound { .. })
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CatalogError::Validation(_))
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Product,
            id: "0192a7a4-7c1e-7000-8000-000000000001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "product with id 0192a7a4-7c1e-7000-8000-000000000001 not found"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::RequiredFieldMissing {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::InvalidValue {
            field: "price".to_string(),
            reason: "must be greater than 0".to_string(),
        };
        assert_eq!(err.to_string(), "price must be greater than 0");
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "CATALOG_GRPC_PORT".to_string(),
            value: "abc".to_string(),
            reason: "must be a port number".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("CATALOG_GRPC_PORT"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_catalog_error_classification() {
        let not_found: CatalogError = StorageError::NotFound {
            entity_type: EntityType::Product,
            id: "x".to_string(),
        }
        .into();
        assert!(not_found.is_not_found());
        assert!(!not_found.is_validation());

        let miss: CatalogError = CacheError::KeyNotFound {
            key: "x".to_string(),
        }
        .into();
        assert!(miss.is_not_found());

        let invalid: CatalogError = ValidationError::InvalidId {
            value: "x".to_string(),
        }
        .into();
        assert!(invalid.is_validation());
        assert!(!invalid.is_not_found());
    }
}
