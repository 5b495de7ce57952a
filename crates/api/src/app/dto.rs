//! Request/response bodies that are not plain domain types.

use serde::{Deserialize, Serialize};

use cafeteria_auth::IssuedToken;
use cafeteria_core::{DishId, ProductId};

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct AdjustStockResponse {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct AddOrderItemRequest {
    pub dish_id: DishId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedToken> for LoginResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "bearer",
            expires_in: issued.expires_in,
        }
    }
}
