//! Constants for the catalog API
//!
//! Centralizing constants makes them easy to find, modify, and test.

// ============================================================================
// SERVERS
// ============================================================================

/// Default bind address for both servers
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default gRPC port
pub const DEFAULT_GRPC_PORT: u16 = 50051;

/// Default REST port
pub const DEFAULT_REST_PORT: u16 = 8000;

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// PAGINATION
// ============================================================================

/// Page size used when a list request passes limit 0
pub const DEFAULT_PAGE_SIZE: usize = 100;

// ============================================================================
// CACHE REFRESH
// ============================================================================

/// Default refresh period in seconds
pub const DEFAULT_PRODUCTS_CACHE_TTL_SECS: u64 = 60;

/// Default bound on one snapshot fetch, in seconds
pub const DEFAULT_REFRESH_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default time the server waits for the first snapshot before serving, in seconds
pub const DEFAULT_WARMUP_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// DATABASE
// ============================================================================

/// Table holding product documents
pub const PRODUCTS_TABLE: &str = "catalog_products";

/// Default connection pool size
pub const DEFAULT_DB_POOL_SIZE: usize = 16;

/// Default pool checkout timeout in seconds
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// SEEDING
// ============================================================================

/// Products created by the populate tool
pub const DEFAULT_POPULATE_COUNT: usize = 50_000;

/// Rows per bulk insert statement
pub const POPULATE_CHUNK_SIZE: usize = 5_000;

/// Overall deadline for the populate tool, in seconds
pub const POPULATE_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// REQUEST IDS
// ============================================================================

/// Header carrying the request id on both surfaces
pub const REQUEST_ID_HEADER: &str = "x-request-id";
