//! Orders. Line items that move stock go through the inventory ledger.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::OrderId;
use cafeteria_orders::OrderDraft;

use crate::app::dto;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/items", post(add_order_item))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.orders.list().await)
}

/// The order with its lines, each carrying its dish.
pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_READ) {
        return resp;
    }
    let id: OrderId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.orders.details(id).await)
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<OrderDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_WRITE) {
        return resp;
    }
    common::respond(StatusCode::CREATED, services.orders.create(body).await)
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<OrderDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_WRITE) {
        return resp;
    }
    let id: OrderId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.orders.update(id, body).await)
}

/// Returns every line's ingredients to stock, then removes the order.
pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_WRITE) {
        return resp;
    }
    let id: OrderId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.ledger.delete_order(id).await)
}

/// Adds a dish to the order, merging into an existing line for that dish.
pub async fn add_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddOrderItemRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_WRITE) {
        return resp;
    }
    let order_id: OrderId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = services
        .ledger
        .create_order_item(order_id, body.dish_id, body.quantity)
        .await;
    common::respond(StatusCode::CREATED, result)
}
