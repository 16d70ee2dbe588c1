//! Shared application state for Axum routers.

use std::time::Instant;

use crate::service::ProductService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Product orchestrator; every product route goes through it.
    pub service: ProductService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: ProductService) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(ProductService, service);
