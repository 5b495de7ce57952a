//! Menu domain module: dishes, their recipes and menu availability.
//!
//! Pure domain types and validation (no IO, no HTTP, no storage).

pub mod dish;
pub mod menu;

pub use dish::{Dish, DishDraft, DishIngredient, DishIngredientDraft};
pub use menu::{MenuItem, MenuItemDraft};
