//! REST surface tests, driven through the full axum router.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use catalog_api::constants::REQUEST_ID_HEADER;
use catalog_test_utils::*;
use serde_json::json;
use support::{products_of, router_for, send, service_over};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_list_update_delete_chain() -> CatalogResult<()> {
    let (store, products) = seeded_store(3);
    let service = service_over(Arc::new(store.clone()));
    service.refresh_once(FETCH_TIMEOUT).await?;
    let router = router_for(service);

    let (status, body) = send(&router, Method::GET, "/api/v1/products?limit=3&offset=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products_of(&body), products);

    let target = products[1].clone();
    let (status, body) = send(
        &router,
        Method::PUT,
        &format!("/api/v1/products/{}", target.id),
        Some(json!({"name": "renamed", "description": "new text", "price": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");
    assert_eq!(body["id"], target.id.to_string());

    let (_, body) = send(&router, Method::GET, "/api/v1/products", None).await;
    let listed = products_of(&body);
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[1].name, "renamed");
    assert_eq!(listed[1].price, 42);

    let (status, body) = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/products/{}", target.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (_, body) = send(&router, Method::GET, "/api/v1/products", None).await;
    assert_eq!(
        products_of(&body),
        vec![products[0].clone(), products[2].clone()]
    );
    assert_eq!(store.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_list_window_and_default_limit() -> CatalogResult<()> {
    let (store, products) = seeded_store(150);
    let service = service_over(Arc::new(store));
    service.refresh_once(FETCH_TIMEOUT).await?;
    let router = router_for(service);

    let (_, body) = send(&router, Method::GET, "/api/v1/products?limit=0", None).await;
    assert_eq!(products_of(&body).len(), 100);

    let (_, body) = send(&router, Method::GET, "/api/v1/products?limit=10&offset=145", None).await;
    assert_eq!(products_of(&body), products[145..].to_vec());

    let (_, body) = send(&router, Method::GET, "/api/v1/products?offset=500", None).await;
    assert!(products_of(&body).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let router = router_for(service_over(Arc::new(InMemoryProductStore::new())));

    let (status, body) = send(
        &router,
        Method::PUT,
        "/api/v1/products/not-an-id",
        Some(json!({"name": "a", "description": "b", "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FORMAT");
    assert_eq!(body["message"], "wrong id format");

    let (status, body) = send(&router, Method::DELETE, "/api/v1/products/42", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "wrong id format");
}

#[tokio::test]
async fn test_validation_messages() {
    let (store, products) = seeded_store(1);
    let router = router_for(service_over(Arc::new(store.clone())));
    let uri = format!("/api/v1/products/{}", products[0].id);

    let (status, body) = send(
        &router,
        Method::PUT,
        &uri,
        Some(json!({"description": "b", "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
    assert_eq!(body["message"], "name is required");

    let (status, body) = send(
        &router,
        Method::PUT,
        &uri,
        Some(json!({"name": "a", "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "description is required");

    let (status, body) = send(
        &router,
        Method::PUT,
        &uri,
        Some(json!({"name": "a", "description": "b", "price": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["message"], "price must be greater than 0");

    // Nothing reached the store.
    assert_eq!(store.get(products[0].id).ok().flatten(), Some(products[0].clone()));
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let router = router_for(service_over(Arc::new(InMemoryProductStore::new())));
    let id = new_product_id();

    let (status, body) = send(
        &router,
        Method::PUT,
        &format!("/api/v1/products/{id}"),
        Some(json!({"name": "a", "description": "b", "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ENTITY_NOT_FOUND");

    let (status, _) = send(&router, Method::DELETE, &format!("/api/v1/products/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_hides_details() {
    let (store, products) = seeded_store(1);
    let flaky = Arc::new(FlakyStore::new(store));
    flaky.set_fail_writes(true);
    let router = router_for(service_over(flaky));

    let (status, body) = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/products/{}", products[0].id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("injected"));
}

#[tokio::test]
async fn test_readiness_follows_cache_warmth() -> CatalogResult<()> {
    let (store, _) = seeded_store(2);
    let service = service_over(Arc::new(store));
    let router = router_for(service.clone());

    let (status, body) = send(&router, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Cache not yet populated");
    assert_eq!(body["details"]["cache"]["status"], "unhealthy");

    service.refresh_once(FETCH_TIMEOUT).await?;

    let (status, body) = send(&router, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["cache"]["entries"], 2);
    assert!(body["details"]["cache"]["last_refreshed_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_liveness_and_ping() {
    let router = router_for(service_over(Arc::new(InMemoryProductStore::new())));

    let (status, body) = send(&router, Method::GET, "/health/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");

    let (status, body) = send(&router, Method::GET, "/health/live", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let router = router_for(service_over(Arc::new(InMemoryProductStore::new())));

    let request = Request::builder()
        .uri("/health/ping")
        .header(REQUEST_ID_HEADER, "req-123")
        .body(Body::empty())
        .expect("request should build");
    let response = router.clone().oneshot(request).await.expect("infallible");
    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
        Some("req-123")
    );

    let request = Request::builder()
        .uri("/health/ping")
        .body(Body::empty())
        .expect("request should build");
    let response = router.oneshot(request).await.expect("infallible");
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_metrics_and_openapi_are_served() {
    let router = router_for(service_over(Arc::new(InMemoryProductStore::new())));

    let (status, _) = send(&router, Method::GET, "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_str()
        .unwrap_or_default()
        .contains("catalog_http_requests_total"));

    let (status, body) = send(&router, Method::GET, "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Catalog API");
}
