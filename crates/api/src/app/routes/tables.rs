use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use cafeteria_auth::Permission;
use cafeteria_core::TableId;
use cafeteria_orders::TableDraft;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tables).post(create_table))
        .route("/:id", get(get_table).put(update_table).delete(delete_table))
}

pub async fn list_tables(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.tables.list().await)
}

pub async fn get_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_READ) {
        return resp;
    }
    let id: TableId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.tables.get(id).await)
}

pub async fn create_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<TableDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    common::respond(StatusCode::CREATED, services.tables.create(body).await)
}

pub async fn update_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<TableDraft>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: TableId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::OK, services.tables.update(id, body).await)
}

pub async fn delete_table(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::CATALOG_WRITE) {
        return resp;
    }
    let id: TableId = match common::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::respond_empty(services.tables.delete(id).await)
}
