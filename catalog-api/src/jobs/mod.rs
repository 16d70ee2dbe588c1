//! Background Jobs for the catalog API
//!
//! - `cache_refresh`: keeps the product cache in sync with the store
//!
//! # Usage
//!
//! ```ignore
//! use catalog_api::jobs::CacheRefreshConfig;
//!
//! let handle = service.start_refresh(CacheRefreshConfig::default());
//! handle.wait_until_warm(Duration::from_secs(15)).await;
//!
//! // On shutdown
//! let snapshot = handle.stop().await;
//! ```

pub mod cache_refresh;

pub use cache_refresh::{
    cache_refresh_task, spawn_cache_refresh, CacheRefreshConfig, CacheRefreshMetrics,
    CacheRefreshSnapshot, RefreshHandle,
};
