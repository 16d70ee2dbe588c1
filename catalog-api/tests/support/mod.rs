//! Shared helpers for catalog-api integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use catalog_api::{create_api_router, ApiConfig, AppState, ProductService};
use catalog_storage::{EntityCache, MemoryEntityCache, ProductStore};
use catalog_test_utils::Product;
use serde_json::Value;
use tower::ServiceExt;

/// Service over `store` with a fresh in-memory cache.
pub fn service_over(store: Arc<dyn ProductStore>) -> ProductService {
    ProductService::new(store, Arc::new(MemoryEntityCache::<Product>::new()))
}

/// Service over `store` and an explicit cache.
pub fn service_with_cache(
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn EntityCache<Product>>,
) -> ProductService {
    ProductService::new(store, cache)
}

/// Full REST router with development CORS.
pub fn router_for(service: ProductService) -> Router {
    create_api_router(AppState::new(service), &ApiConfig::default())
}

/// Send one request through the router and decode the body as JSON.
///
/// Empty bodies decode to `Value::Null`; non-JSON bodies to a string.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request should build");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Decode the `products` array of a list response.
pub fn products_of(body: &Value) -> Vec<Product> {
    serde_json::from_value(body["products"].clone()).expect("list body should hold products")
}
