//! The `catalog_cache_entries` gauge tracks the cache after every mirror.
//!
//! Kept in its own test binary: the gauge is process-global.

mod support;

use std::sync::Arc;
use std::time::Duration;

use catalog_api::telemetry::metrics;
use catalog_test_utils::*;
use support::service_over;

fn cache_entries_gauge() -> f64 {
    metrics().map(|m| m.cache_entries.get()).unwrap_or(-1.0)
}

#[tokio::test]
async fn test_gauge_follows_writes_between_refreshes() -> CatalogResult<()> {
    let (store, products) = seeded_store(3);
    let service = service_over(Arc::new(store));

    service.refresh_once(Duration::from_secs(5)).await?;
    assert_eq!(cache_entries_gauge(), 3.0);

    service.delete(products[0].id).await?;
    assert_eq!(cache_entries_gauge(), 2.0);

    service
        .update(
            products[1].id,
            Product {
                price: 5,
                ..products[1].clone()
            },
        )
        .await?;
    assert_eq!(cache_entries_gauge(), 2.0);

    service.seed(vec![make_product("only")])?;
    assert_eq!(cache_entries_gauge(), 1.0);
    Ok(())
}
