use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::DishIngredientId;
use cafeteria_menu::DishIngredientDraft;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route("/:id", get(get_ingredient).put(update_ingredient).delete(delete_ingredient))
}

pub async fn list_ingredients(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.ingredients.list().await)
}

pub async fn get_ingredient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    let id: DishIngredientId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.ingredients.get(id).await)
}

pub async fn create_ingredient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<DishIngredientDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    common::respond(StatusCode::CREATED, services.ingredients.create(body).await)
}

pub async fn update_ingredient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<DishIngredientDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: DishIngredientId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.ingredients.update(id, body).await)
}

pub async fn delete_ingredient(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: DishIngredientId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.ingredients.delete(id).await)
}
