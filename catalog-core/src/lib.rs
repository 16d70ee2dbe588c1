//! Catalog Core - Entity Types
//!
//! Plain data structures shared by every other crate in the workspace:
//! the product entity, its identity, and the error taxonomy.
//! No I/O lives here.

pub mod entities;
pub mod error;
pub mod identity;

pub use entities::{EntityType, Product};
pub use error::{
    CacheError, CatalogError, CatalogResult, ConfigError, StorageError, ValidationError,
};
pub use identity::{new_product_id, ProductId, Timestamp};
