//! gRPC Service Implementation
//!
//! Implements `catalog.v1.ProductService` from proto/catalog.proto on top of
//! [`ProductService`], so REST and gRPC share every rule. A request-id
//! interceptor tags each call; the id is carried on the handler span.

use std::time::Instant;

use catalog_core::{CatalogError, Product, ProductId};
use tonic::service::interceptor::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::constants::REQUEST_ID_HEADER;
use crate::error::{ApiError, ErrorCode};
use crate::service::ProductService;
use crate::telemetry::metrics;

/// Generated protobuf types and service traits.
pub mod proto {
    tonic::include_proto!("catalog.v1");
}

use proto::product_service_server::{
    ProductService as ProductServiceRpc, ProductServiceServer,
};

// ============================================================================
// REQUEST IDS
// ============================================================================

/// Request id attached by [`request_id_interceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Take the caller's `x-request-id` or mint a UUID v4, and store it in the
/// request extensions.
pub fn request_id_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    let id = request
        .metadata()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    request.extensions_mut().insert(RequestId(id));
    Ok(request)
}

fn request_id_of<T>(request: &Request<T>) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default()
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

impl From<ApiError> for Status {
    fn from(err: ApiError) -> Self {
        match err.code {
            ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidFormat => Status::invalid_argument(err.message),
            ErrorCode::EntityNotFound => Status::not_found(err.message),
            // Infrastructure details stay server-side.
            ErrorCode::InternalError
            | ErrorCode::DatabaseError
            | ErrorCode::ServiceUnavailable
            | ErrorCode::Timeout => Status::internal(ErrorCode::InternalError.default_message()),
        }
    }
}

fn to_status(err: CatalogError) -> Status {
    ApiError::from(err).into()
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<Product> for proto::Product {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price: product.price,
        }
    }
}

/// Parse the wire product. The id must be a valid product id.
fn product_from_proto(product: proto::Product) -> Result<(ProductId, Product), Status> {
    let id = ProductId::parse(&product.id).map_err(|e| to_status(e.into()))?;
    Ok((
        id,
        Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
        },
    ))
}

// ============================================================================
// SERVICE
// ============================================================================

/// gRPC front of the product service.
#[derive(Clone)]
pub struct ProductGrpcService {
    service: ProductService,
}

impl ProductGrpcService {
    pub fn new(service: ProductService) -> Self {
        Self { service }
    }
}

fn observe<T>(method: &'static str, start: Instant, result: &Result<T, Status>) {
    if let Some(metrics) = metrics() {
        let code = match result {
            Ok(_) => tonic::Code::Ok,
            Err(status) => status.code(),
        };
        metrics.record_grpc_request(method, code, start.elapsed().as_secs_f64());
    }
}

#[tonic::async_trait]
impl ProductServiceRpc for ProductGrpcService {
    async fn get_products(
        &self,
        request: Request<proto::GetProductsRequest>,
    ) -> Result<Response<proto::ProductList>, Status> {
        let start = Instant::now();
        let span = info_span!("grpc_request", rpc.method = "GetProducts", request_id = %request_id_of(&request));
        let req = request.into_inner();

        let result = async {
            let products = self
                .service
                .list(req.limit as usize, req.offset as usize)
                .into_iter()
                .map(proto::Product::from)
                .collect();
            Ok(Response::new(proto::ProductList { products }))
        }
        .instrument(span)
        .await;

        observe("GetProducts", start, &result);
        result
    }

    async fn update_product(
        &self,
        request: Request<proto::Product>,
    ) -> Result<Response<proto::Product>, Status> {
        let start = Instant::now();
        let span = info_span!("grpc_request", rpc.method = "UpdateProduct", request_id = %request_id_of(&request));
        let req = request.into_inner();

        let result = async {
            let (id, candidate) = product_from_proto(req)?;
            let stored = self
                .service
                .update(id, candidate)
                .await
                .map_err(to_status)?;
            Ok(Response::new(stored.into()))
        }
        .instrument(span)
        .await;

        observe("UpdateProduct", start, &result);
        result
    }

    async fn delete_product(
        &self,
        request: Request<proto::Id>,
    ) -> Result<Response<proto::Empty>, Status> {
        let start = Instant::now();
        let span = info_span!("grpc_request", rpc.method = "DeleteProduct", request_id = %request_id_of(&request));
        let req = request.into_inner();

        let result = async {
            let id = ProductId::parse(&req.id).map_err(|e| to_status(e.into()))?;
            self.service.delete(id).await.map_err(to_status)?;
            Ok(Response::new(proto::Empty {}))
        }
        .instrument(span)
        .await;

        observe("DeleteProduct", start, &result);
        result
    }
}

/// Interceptor function type used by [`create_service`].
pub type RequestIdInterceptor = fn(Request<()>) -> Result<Request<()>, Status>;

/// Build the gRPC service with the request-id interceptor installed.
pub fn create_service(
    service: ProductService,
) -> InterceptedService<ProductServiceServer<ProductGrpcService>, RequestIdInterceptor> {
    ProductServiceServer::with_interceptor(
        ProductGrpcService::new(service),
        request_id_interceptor as RequestIdInterceptor,
    )
}
