//! Catalog API - REST/gRPC surfaces and cache orchestration
//!
//! This crate serves the product catalog. Every read is answered from an
//! in-process [`catalog_storage::EntityCache`] that a background job keeps in
//! sync with the PostgreSQL store; writes go to the store first and are then
//! mirrored into the cache. REST endpoints are served by Axum and the RPC
//! surface by Tonic, both on top of the same [`ProductService`].

#[macro_use]
mod macros;

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod grpc;
pub mod jobs;
pub mod openapi;
pub mod routes;
pub mod service;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig, PgProductStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use grpc::{create_service, proto, ProductGrpcService};
pub use jobs::{CacheRefreshConfig, RefreshHandle};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use service::{effective_limit, ProductService, RefreshOutcome};
pub use state::AppState;
pub use types::*;
