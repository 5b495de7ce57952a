use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::MenuItemId;
use cafeteria_menu::MenuItemDraft;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Menu entries: which dishes are on offer.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_menu_items).post(create_menu_item))
        .route("/:id", get(get_menu_item).put(update_menu_item).delete(delete_menu_item))
}

pub async fn list_menu_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.menu.list().await)
}

pub async fn get_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    let id: MenuItemId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.menu.get(id).await)
}

pub async fn create_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<MenuItemDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    common::respond(StatusCode::CREATED, services.menu.create(body).await)
}

pub async fn update_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<MenuItemDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: MenuItemId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.menu.update(id, body).await)
}

pub async fn delete_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: MenuItemId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.menu.delete(id).await)
}
