use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::ProductId;
use cafeteria_products::ProductDraft;

use crate::app::dto;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/adjust", post(adjust_stock))
}

/// Unauthenticated stock overview (no exact quantities).
pub fn public_router() -> Router {
    Router::new().route("/public", get(list_public_products))
}

pub async fn list_public_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    common::respond(StatusCode::OK, services.products.list_public().await)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.products.list().await)
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    let id: ProductId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.products.get(id).await)
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<ProductDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    common::respond(StatusCode::CREATED, services.products.create(body).await)
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ProductDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: ProductId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.products.update(id, body).await)
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: ProductId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.products.delete(id).await)
}

/// Signed stock correction through the ledger.
pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::STOCK_ADJUST) {
        return resp;
    }
    let product_id: ProductId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger.adjust_stock(product_id, body.delta).await {
        Ok(quantity) => Json(dto::AdjustStockResponse {
            product_id,
            quantity,
        })
        .into_response(),
        Err(e) => crate::app::errors::store_error_to_response(e),
    }
}
