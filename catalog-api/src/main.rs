//! Catalog API Server Entry Point
//!
//! Bootstraps configuration and telemetry, warms the product cache from
//! PostgreSQL, then serves REST and gRPC until SIGINT/SIGTERM.

use std::sync::Arc;

use catalog_api::telemetry::{init_tracer, TelemetryConfig};
use catalog_api::{
    create_api_router, create_service, ApiConfig, ApiError, ApiResult, AppState, DbClient,
    DbConfig, PgProductStore, ProductService,
};
use catalog_core::Product;
use catalog_storage::MemoryEntityCache;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    dotenv::dotenv().ok();

    let config = ApiConfig::from_env()?;
    let telemetry = init_tracer(&TelemetryConfig::from_env(config.debug))?;

    let db = DbClient::from_config(&DbConfig::from_env()?)?;
    let store = PgProductStore::new(db);
    store.ensure_schema().await?;

    let service = ProductService::new(
        Arc::new(store),
        Arc::new(MemoryEntityCache::<Product>::new()),
    );

    let refresh = service.start_refresh(config.refresh.clone());
    if !refresh.wait_until_warm(config.warmup_timeout).await {
        tracing::warn!(
            timeout_secs = config.warmup_timeout.as_secs(),
            "Cache not populated before warm-up timeout, serving anyway"
        );
    }

    let rest_addr = config.rest_addr()?;
    let grpc_addr = config.grpc_addr()?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app = create_api_router(AppState::new(service.clone()), &config);
    let listener = tokio::net::TcpListener::bind(rest_addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", rest_addr, e)))?;

    let rest = {
        let mut shutdown = shutdown_rx.clone();
        async move {
            tracing::info!(addr = %rest_addr, "Starting REST server");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.changed().await;
                })
                .await
                .map_err(|e| ApiError::internal_error(format!("REST server error: {}", e)))
        }
    };

    let grpc = {
        let mut shutdown = shutdown_rx;
        let svc = create_service(service);
        async move {
            tracing::info!(addr = %grpc_addr, "Starting gRPC server");
            tonic::transport::Server::builder()
                .add_service(svc)
                .serve_with_shutdown(grpc_addr, async move {
                    let _ = shutdown.changed().await;
                })
                .await
                .map_err(|e| ApiError::internal_error(format!("gRPC server error: {}", e)))
        }
    };

    let signal = async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
        Ok::<(), ApiError>(())
    };

    let served = tokio::try_join!(rest, grpc, signal);

    let snapshot = refresh.stop().await;
    tracing::info!(
        refresh_cycles = snapshot.refresh_cycles,
        refresh_failures = snapshot.refresh_failures,
        "Cache refresh stopped"
    );
    telemetry.shutdown();

    served.map(|_| ())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
