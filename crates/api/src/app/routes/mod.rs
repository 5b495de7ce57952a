use axum::{routing::get, Router};

pub mod auth;
pub mod common;
pub mod dishes;
pub mod ingredients;
pub mod menu;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod system;
pub mod tables;
pub mod units;
pub mod users;

/// Endpoints reachable without a token (mounted under `/api`).
pub fn public_router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::public_router())
}

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/units", units::router())
        .nest("/products", products::router())
        .nest("/dishes", dishes::router())
        .nest("/dish-ingredients", ingredients::router())
        .nest("/menu", menu::router())
        .nest("/tables", tables::router())
        .nest("/orders", orders::router())
        .nest("/order-items", order_items::router())
}
