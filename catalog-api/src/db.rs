//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the product
//! store on top of it. Products are kept as JSONB documents keyed by id, so
//! the stored shape is exactly the serialized [`Product`].

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use catalog_core::{
    CatalogError, CatalogResult, ConfigError, EntityType, Product, ProductId, StorageError,
};
use catalog_storage::ProductStore;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use serde_json::Value as JsonValue;
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::config::env_parse;
use crate::constants::{DEFAULT_DB_POOL_SIZE, DEFAULT_DB_TIMEOUT_SECS, PRODUCTS_TABLE};
use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection checkout timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "catalog".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: DEFAULT_DB_POOL_SIZE,
            timeout: Duration::from_secs(DEFAULT_DB_TIMEOUT_SECS),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// Reads `CATALOG_DB_HOST`, `CATALOG_DB_PORT`, `CATALOG_DB_NAME`,
    /// `CATALOG_DB_USER`, `CATALOG_DB_PASSWORD`, `CATALOG_DB_POOL_SIZE`
    /// and `CATALOG_DB_TIMEOUT` (seconds).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: std::env::var("CATALOG_DB_HOST").unwrap_or(defaults.host),
            port: env_parse("CATALOG_DB_PORT", defaults.port)?,
            dbname: std::env::var("CATALOG_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("CATALOG_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("CATALOG_DB_PASSWORD").unwrap_or_default(),
            max_size: env_parse("CATALOG_DB_POOL_SIZE", defaults.max_size)?,
            timeout: Duration::from_secs(env_parse(
                "CATALOG_DB_TIMEOUT",
                DEFAULT_DB_TIMEOUT_SECS,
            )?),
        })
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> CatalogResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }
}

fn pool_error(err: PoolError) -> CatalogError {
    tracing::error!("Connection pool error: {:?}", err);
    let reason = match err {
        PoolError::Timeout(_) => "connection pool exhausted".to_string(),
        PoolError::Closed => "connection pool is closed".to_string(),
        other => format!("failed to acquire database connection: {}", other),
    };
    CatalogError::Storage(StorageError::Unavailable { reason })
}

fn query_error(err: tokio_postgres::Error) -> CatalogError {
    tracing::error!("Database error: {:?}", err);
    CatalogError::Storage(StorageError::QueryFailed {
        reason: err.to_string(),
    })
}

fn serialization_error(err: serde_json::Error) -> CatalogError {
    CatalogError::Storage(StorageError::Serialization {
        reason: err.to_string(),
    })
}

fn not_found(id: ProductId) -> CatalogError {
    CatalogError::Storage(StorageError::NotFound {
        entity_type: EntityType::Product,
        id: id.to_string(),
    })
}

/// Run a store operation and record its outcome and latency.
async fn timed<T, F>(operation: &'static str, fut: F) -> CatalogResult<T>
where
    F: Future<Output = CatalogResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    if let Some(metrics) = metrics() {
        metrics.record_db_operation(
            operation,
            EntityType::Product.as_str(),
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
    }
    result
}

// ============================================================================
// PRODUCT STORE
// ============================================================================

/// PostgreSQL-backed product store.
#[derive(Clone)]
pub struct PgProductStore {
    db: DbClient,
}

impl PgProductStore {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    pub fn client(&self) -> &DbClient {
        &self.db
    }

    /// Create the products table if it does not exist.
    pub async fn ensure_schema(&self) -> CatalogResult<()> {
        let conn = self.db.get_conn().await?;
        conn.batch_execute(&format!(
            "CREATE TABLE IF NOT EXISTS {PRODUCTS_TABLE} (
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL
            )"
        ))
        .await
        .map_err(query_error)
    }

    /// Remove every product. Used by the DB-backed tests.
    pub async fn truncate(&self) -> CatalogResult<()> {
        let conn = self.db.get_conn().await?;
        conn.batch_execute(&format!("TRUNCATE {PRODUCTS_TABLE}"))
            .await
            .map_err(query_error)
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn product_list_all(&self) -> CatalogResult<Vec<Product>> {
        timed("list_all", async {
            let conn = self.db.get_conn().await?;
            let rows = conn
                .query(
                    &format!("SELECT doc FROM {PRODUCTS_TABLE} ORDER BY id"),
                    &[],
                )
                .await
                .map_err(query_error)?;

            rows.iter()
                .map(|row| {
                    let doc: JsonValue = row.try_get(0).map_err(query_error)?;
                    serde_json::from_value(doc).map_err(serialization_error)
                })
                .collect()
        })
        .await
    }

    async fn product_update(&self, id: ProductId, product: &Product) -> CatalogResult<Product> {
        timed("update", async {
            let stored = Product {
                id,
                ..product.clone()
            };
            let doc = serde_json::to_value(&stored).map_err(serialization_error)?;
            let conn = self.db.get_conn().await?;
            let updated = conn
                .execute(
                    &format!("UPDATE {PRODUCTS_TABLE} SET doc = $2 WHERE id = $1"),
                    &[&id.as_uuid(), &doc],
                )
                .await
                .map_err(query_error)?;

            if updated == 0 {
                return Err(not_found(id));
            }
            Ok(stored)
        })
        .await
    }

    async fn product_delete(&self, id: ProductId) -> CatalogResult<()> {
        timed("delete", async {
            let conn = self.db.get_conn().await?;
            let deleted = conn
                .execute(
                    &format!("DELETE FROM {PRODUCTS_TABLE} WHERE id = $1"),
                    &[&id.as_uuid()],
                )
                .await
                .map_err(query_error)?;

            if deleted == 0 {
                return Err(not_found(id));
            }
            Ok(())
        })
        .await
    }

    async fn product_insert_many(&self, products: &[Product]) -> CatalogResult<()> {
        timed("insert_many", async {
            let ids: Vec<Uuid> = products.iter().map(|p| p.id.as_uuid()).collect();
            let docs = products
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<JsonValue>, _>>()
                .map_err(serialization_error)?;

            let conn = self.db.get_conn().await?;
            conn.execute(
                &format!(
                    "INSERT INTO {PRODUCTS_TABLE} (id, doc)
                     SELECT * FROM UNNEST($1::uuid[], $2::jsonb[])"
                ),
                &[&ids, &docs],
            )
            .await
            .map_err(query_error)?;
            Ok(())
        })
        .await
    }

    async fn health_check(&self) -> CatalogResult<()> {
        timed("health_check", async {
            let conn = self.db.get_conn().await?;
            conn.query_one("SELECT 1", &[]).await.map_err(query_error)?;
            Ok(())
        })
        .await
    }
}
