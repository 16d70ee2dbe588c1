//! OpenAPI document for the catalog API
//!
//! Generated from Rust types and route annotations with utoipa, served at
//! /openapi.json.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{CacheHealth, ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{health, product};
use crate::telemetry::metrics;
use crate::types::{ListProductsResponse, UpdateProductRequest};
use catalog_core::{Product, ProductId};

/// OpenAPI document for the catalog REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        description = "Product catalog served from an in-process cache kept in sync with the document store",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:8000", description = "Local Development")
    ),
    tags(
        (name = "Products", description = "Catalog reads and writes"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics"),
    ),
    paths(
        product::list_products,
        product::update_product,
        product::delete_product,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        Product,
        ProductId,
        ListProductsResponse,
        UpdateProductRequest,
        ApiError,
        ErrorCode,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
        CacheHealth,
    ))
)]
pub struct ApiDoc;
