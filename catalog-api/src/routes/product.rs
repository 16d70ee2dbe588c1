//! Product REST endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use catalog_core::{Product, ProductId};

use crate::error::{ApiError, ApiResult};
use crate::service::ProductService;
use crate::state::AppState;
use crate::types::{ListProductsQuery, ListProductsResponse, UpdateProductRequest};

/// GET /api/v1/products - A window of the cached catalog
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Products in cache order", body = ListProductsResponse),
    ),
)]
pub async fn list_products(
    State(service): State<ProductService>,
    Query(params): Query<ListProductsQuery>,
) -> Json<ListProductsResponse> {
    let products = service.list(
        params.limit.unwrap_or(0) as usize,
        params.offset.unwrap_or(0) as usize,
    );
    Json(ListProductsResponse { products })
}

/// PUT /api/v1/products/{id} - Replace an existing product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Stored product", body = Product),
        (status = 400, description = "Invalid id or product", body = ApiError),
        (status = 404, description = "Product not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    ),
)]
pub async fn update_product(
    State(service): State<ProductService>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    let id = ProductId::parse(&id)?;
    let candidate = Product::new(id, req.name, req.description, req.price);
    let stored = service.update(id, candidate).await?;
    Ok(Json(stored))
}

/// DELETE /api/v1/products/{id} - Delete an existing product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 400, description = "Invalid id", body = ApiError),
        (status = 404, description = "Product not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError),
    ),
)]
pub async fn delete_product(
    State(service): State<ProductService>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = ProductId::parse(&id)?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the product router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", put(update_product).delete(delete_product))
}
