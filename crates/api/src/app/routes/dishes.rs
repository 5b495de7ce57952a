use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::DishId;
use cafeteria_menu::DishDraft;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_dishes).post(create_dish))
        .route("/:id", get(get_dish).put(update_dish).delete(delete_dish))
        .route("/:id/ingredients", get(list_dish_ingredients))
}

pub async fn list_dishes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.dishes.list().await)
}

pub async fn get_dish(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    let id: DishId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.dishes.get(id).await)
}

pub async fn create_dish(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<DishDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    common::respond(StatusCode::CREATED, services.dishes.create(body).await)
}

pub async fn update_dish(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<DishDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: DishId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.dishes.update(id, body).await)
}

pub async fn delete_dish(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: DishId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.dishes.delete(id).await)
}

/// Bill of materials of one dish, ordered by product.
pub async fn list_dish_ingredients(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    let id: DishId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.dishes.ingredients(id).await)
}
