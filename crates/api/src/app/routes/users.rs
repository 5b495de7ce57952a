use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, routing::get, Router};

use cafeteria_auth::Permission;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_users))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = common::guard(&principal, &Permission::USERS_READ) {
        return resp;
    }
    common::respond(StatusCode::OK, services.users.list().await)
}
