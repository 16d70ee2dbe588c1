//! Request and response bodies for the REST surface.

use catalog_core::Product;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string for `GET /api/v1/products`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Page size; 0 or absent selects the default
    pub limit: Option<u32>,
    /// Position of the first product in the cached sequence
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListProductsResponse {
    pub products: Vec<Product>,
}

/// Body of `PUT /api/v1/products/{id}`. The id comes from the path.
///
/// Missing fields default to empty so validation reports them by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProductRequest {
    pub name: String,
    pub description: String,
    pub price: i32,
}
