//! gRPC handler tests and REST ↔ gRPC parity.
//!
//! The generated service trait is called directly, without a transport.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use catalog_api::grpc::request_id_interceptor;
use catalog_api::proto::product_service_server::ProductService as ProductServiceRpc;
use catalog_api::{proto, ProductGrpcService};
use catalog_test_utils::*;
use serde_json::json;
use support::{products_of, router_for, send, service_over};
use tonic::{Code, Request};

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

fn wire(product: &Product) -> proto::Product {
    proto::Product {
        id: product.id.to_string(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price,
    }
}

#[tokio::test]
async fn test_get_products_window() -> CatalogResult<()> {
    let (store, products) = seeded_store(5);
    let service = service_over(Arc::new(store));
    service.refresh_once(FETCH_TIMEOUT).await?;
    let grpc = ProductGrpcService::new(service);

    let listed = grpc
        .get_products(Request::new(proto::GetProductsRequest { limit: 2, offset: 1 }))
        .await
        .map(|r| r.into_inner().products);
    let expected: Vec<proto::Product> = products[1..3].iter().map(wire).collect();
    assert_eq!(listed.ok(), Some(expected));

    let listed = grpc
        .get_products(Request::new(proto::GetProductsRequest { limit: 0, offset: 0 }))
        .await
        .map(|r| r.into_inner().products.len());
    assert_eq!(listed.ok(), Some(5));
    Ok(())
}

#[tokio::test]
async fn test_update_and_delete() -> CatalogResult<()> {
    let (store, products) = seeded_store(2);
    let service = service_over(Arc::new(store.clone()));
    service.refresh_once(FETCH_TIMEOUT).await?;
    let grpc = ProductGrpcService::new(service.clone());

    let mut changed = wire(&products[0]);
    changed.name = "over the wire".to_string();
    let stored = grpc
        .update_product(Request::new(changed.clone()))
        .await
        .map(|r| r.into_inner());
    assert_eq!(stored.ok(), Some(changed));
    assert_eq!(service.list(10, 0)[0].name, "over the wire");

    let deleted = grpc
        .delete_product(Request::new(proto::Id {
            id: products[1].id.to_string(),
        }))
        .await;
    assert!(deleted.is_ok());
    assert_eq!(store.len(), 1);
    assert_eq!(service.list(10, 0).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_status_codes() {
    let (store, products) = seeded_store(1);
    let grpc = ProductGrpcService::new(service_over(Arc::new(store)));

    let err = grpc
        .delete_product(Request::new(proto::Id { id: "nope".into() }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "wrong id format");

    let mut invalid = wire(&products[0]);
    invalid.price = 0;
    let err = grpc.update_product(Request::new(invalid)).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "price must be greater than 0");

    let err = grpc
        .delete_product(Request::new(proto::Id {
            id: new_product_id().to_string(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_infrastructure_errors_are_internal() {
    let (store, products) = seeded_store(1);
    let flaky = Arc::new(FlakyStore::new(store));
    flaky.set_fail_writes(true);
    let grpc = ProductGrpcService::new(service_over(flaky));

    let err = grpc
        .update_product(Request::new(wire(&products[0])))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(err.message(), "Internal server error");
}

#[tokio::test]
async fn test_interceptor_then_handler() -> CatalogResult<()> {
    let (store, _) = seeded_store(1);
    let service = service_over(Arc::new(store));
    service.refresh_once(FETCH_TIMEOUT).await?;
    let grpc = ProductGrpcService::new(service);

    let tagged = request_id_interceptor(Request::new(()))
        .map_err(|s| CatalogError::Storage(StorageError::Unavailable { reason: s.to_string() }))?;
    let (metadata, extensions, ()) = tagged.into_parts();
    let request = Request::from_parts(
        metadata,
        extensions,
        proto::GetProductsRequest { limit: 10, offset: 0 },
    );

    let listed = grpc.get_products(request).await.map(|r| r.into_inner().products.len());
    assert_eq!(listed.ok(), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_rest_and_grpc_agree() -> CatalogResult<()> {
    let (store, products) = seeded_store(4);
    let service = service_over(Arc::new(store));
    service.refresh_once(FETCH_TIMEOUT).await?;
    let router = router_for(service.clone());
    let grpc = ProductGrpcService::new(service);

    let (status, body) = send(&router, Method::GET, "/api/v1/products?limit=3&offset=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let rest: Vec<proto::Product> = products_of(&body).iter().map(wire).collect();
    let rpc = grpc
        .get_products(Request::new(proto::GetProductsRequest { limit: 3, offset: 1 }))
        .await
        .map(|r| r.into_inner().products);
    assert_eq!(rpc.ok(), Some(rest));

    // The same invalid payload is rejected with the same message on both.
    let (status, body) = send(
        &router,
        Method::PUT,
        &format!("/api/v1/products/{}", products[0].id),
        Some(json!({"name": "", "description": "d", "price": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut invalid = wire(&products[0]);
    invalid.name.clear();
    let err = grpc.update_product(Request::new(invalid)).await.unwrap_err();
    assert_eq!(Some(err.message()), body["message"].as_str());
    Ok(())
}
