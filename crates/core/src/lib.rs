//! `cafeteria-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{require_name, DomainError, DomainResult};
pub use id::{
    DishId, DishIngredientId, MenuItemId, OrderId, OrderItemId, ProductId, TableId, UnitId, UserId,
};
