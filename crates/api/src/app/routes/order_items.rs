use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::OrderItemId;

use crate::app::dto;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_order_items))
        .route(
            "/:id",
            get(get_order_item)
                .put(update_order_item)
                .delete(delete_order_item),
        )
}

pub async fn list_order_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.orders.list_items().await)
}

pub async fn get_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_READ) {
        return resp;
    }
    let id: OrderItemId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.orders.get_item(id).await)
}

/// New quantity for a line; stock moves by the difference.
pub async fn update_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderItemRequest>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_WRITE) {
        return resp;
    }
    let id: OrderItemId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(
        StatusCode::OK,
        services.ledger.update_order_item(id, body.quantity).await,
    )
}

pub async fn delete_order_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::ORDERS_WRITE) {
        return resp;
    }
    let id: OrderItemId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.ledger.delete_order_item(id).await)
}
