#![cfg(feature = "db-tests")]
//! PostgreSQL store tests.
//!
//! Need a reachable database configured through the `CATALOG_DB_*`
//! variables. Each test works on products it created itself.

mod support;

use std::sync::Arc;
use std::time::Duration;

use catalog_api::{ApiResult, DbClient, DbConfig, PgProductStore};
use catalog_storage::ProductStore;
use catalog_test_utils::*;
use support::service_over;

async fn test_store() -> ApiResult<PgProductStore> {
    let config = DbConfig::from_env()?;
    let store = PgProductStore::new(DbClient::from_config(&config)?);
    store.ensure_schema().await?;
    Ok(store)
}

#[tokio::test]
async fn smoke_test_pg_store_crud() -> ApiResult<()> {
    let store = test_store().await?;
    let products = make_products(3);
    store.product_insert_many(&products).await?;

    let all = store.product_list_all().await?;
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    for product in &products {
        assert!(all.contains(product));
    }

    let changed = Product {
        name: "pg renamed".to_string(),
        ..products[0].clone()
    };
    let stored = store.product_update(products[0].id, &changed).await?;
    assert_eq!(stored, changed);

    for product in &products {
        store.product_delete(product.id).await?;
    }
    let err = store.product_delete(products[0].id).await.unwrap_err();
    assert!(err.is_not_found());

    store.health_check().await?;
    Ok(())
}

#[tokio::test]
async fn smoke_test_refresh_from_pg() -> ApiResult<()> {
    let store = Arc::new(test_store().await?);
    let products = make_products(2);
    store.product_insert_many(&products).await?;

    let service = service_over(store.clone());
    let outcome = service.refresh_once(Duration::from_secs(10)).await?;
    assert!(outcome.entries >= 2);
    assert!(service.is_warm());

    for product in &products {
        service.delete(product.id).await?;
    }
    Ok(())
}
