//! Service Configuration Module
//!
//! Server addresses, cache timing and CORS settings. Configuration is loaded
//! from environment variables (a `.env` file is read first by the binaries)
//! with sensible defaults for development. Unparsable values are rejected
//! instead of silently replaced by defaults.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use catalog_core::ConfigError;

use crate::constants::{
    DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_GRPC_PORT, DEFAULT_HOST, DEFAULT_PRODUCTS_CACHE_TTL_SECS,
    DEFAULT_REFRESH_FETCH_TIMEOUT_SECS, DEFAULT_REST_PORT, DEFAULT_WARMUP_TIMEOUT_SECS,
};
use crate::jobs::CacheRefreshConfig;

/// Parse an optional environment variable, falling back to `default` when
/// it is unset or empty.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    field: key.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Configuration for the catalog service process.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Human-readable logs and verbose filters.
    pub debug: bool,

    /// Bind address shared by both servers.
    pub host: String,

    pub grpc_port: u16,

    pub rest_port: u16,

    /// Refresh period and per-fetch bound for the product cache.
    pub refresh: CacheRefreshConfig,

    /// How long startup waits for the first snapshot before serving anyway.
    pub warmup_timeout: Duration,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            debug: false,
            host: DEFAULT_HOST.to_string(),
            grpc_port: DEFAULT_GRPC_PORT,
            rest_port: DEFAULT_REST_PORT,
            refresh: CacheRefreshConfig::default(),
            warmup_timeout: Duration::from_secs(DEFAULT_WARMUP_TIMEOUT_SECS),
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `CATALOG_DEBUG`: "true" for pretty logs (default: false)
    /// - `CATALOG_HOST`: Bind address (default: 0.0.0.0)
    /// - `CATALOG_GRPC_PORT`: gRPC port (default: 50051)
    /// - `CATALOG_REST_PORT`: REST port (default: 8000)
    /// - `CATALOG_PRODUCTS_CACHE_TTL_SECS`: Refresh period (default: 60)
    /// - `CATALOG_REFRESH_FETCH_TIMEOUT_SECS`: Snapshot fetch bound (default: 30)
    /// - `CATALOG_WARMUP_TIMEOUT_SECS`: Startup wait for the first snapshot (default: 15)
    /// - `CATALOG_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `CATALOG_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = std::env::var("CATALOG_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let host = std::env::var("CATALOG_HOST")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let config = Self {
            debug: env_flag("CATALOG_DEBUG"),
            host,
            grpc_port: env_parse("CATALOG_GRPC_PORT", DEFAULT_GRPC_PORT)?,
            rest_port: env_parse("CATALOG_REST_PORT", DEFAULT_REST_PORT)?,
            refresh: CacheRefreshConfig::from_env()?,
            warmup_timeout: Duration::from_secs(env_parse(
                "CATALOG_WARMUP_TIMEOUT_SECS",
                DEFAULT_WARMUP_TIMEOUT_SECS,
            )?),
            cors_origins,
            cors_max_age_secs: env_parse("CATALOG_CORS_MAX_AGE_SECS", DEFAULT_CORS_MAX_AGE_SECS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.period.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "CATALOG_PRODUCTS_CACHE_TTL_SECS".to_string(),
                value: "0".to_string(),
                reason: "refresh period must be positive".to_string(),
            });
        }
        if self.refresh.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "CATALOG_REFRESH_FETCH_TIMEOUT_SECS".to_string(),
                value: "0".to_string(),
                reason: "fetch timeout must be positive".to_string(),
            });
        }
        if self.grpc_port == self.rest_port {
            return Err(ConfigError::InvalidValue {
                field: "CATALOG_REST_PORT".to_string(),
                value: self.rest_port.to_string(),
                reason: "REST and gRPC ports must differ".to_string(),
            });
        }
        Ok(())
    }

    pub fn grpc_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.socket_addr("CATALOG_GRPC_PORT", self.grpc_port)
    }

    pub fn rest_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.socket_addr("CATALOG_REST_PORT", self.rest_port)
    }

    fn socket_addr(&self, field: &str, port: u16) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            field: field.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

impl CacheRefreshConfig {
    /// Create CacheRefreshConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `CATALOG_PRODUCTS_CACHE_TTL_SECS`: Refresh period (default: 60)
    /// - `CATALOG_REFRESH_FETCH_TIMEOUT_SECS`: Snapshot fetch bound (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            period: Duration::from_secs(env_parse(
                "CATALOG_PRODUCTS_CACHE_TTL_SECS",
                DEFAULT_PRODUCTS_CACHE_TTL_SECS,
            )?),
            fetch_timeout: Duration::from_secs(env_parse(
                "CATALOG_REFRESH_FETCH_TIMEOUT_SECS",
                DEFAULT_REFRESH_FETCH_TIMEOUT_SECS,
            )?),
        })
    }
}
