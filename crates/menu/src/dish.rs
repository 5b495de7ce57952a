use serde::{Deserialize, Serialize};

use cafeteria_core::{
    require_name, DishId, DishIngredientId, DomainError, DomainResult, ProductId,
};

/// A dish that can be ordered.
///
/// `price` is in the smallest currency unit (kopecks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dish {
    pub id: DishId,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DishDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
}

impl DishDraft {
    pub fn validate(self) -> DomainResult<Self> {
        let name = require_name("name", &self.name)?;
        if self.price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Ok(Self {
            name,
            description,
            price: self.price,
        })
    }
}

/// One bill-of-materials row: `quantity` of `product_id` consumed per unit of `dish_id`.
///
/// Unique per `(dish_id, product_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishIngredient {
    pub id: DishIngredientId,
    pub dish_id: DishId,
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DishIngredientDraft {
    pub dish_id: DishId,
    pub product_id: ProductId,
    pub quantity: i64,
}

impl DishIngredientDraft {
    pub fn validate(self) -> DomainResult<Self> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(
                "ingredient quantity must be positive",
            ));
        }
        Ok(self)
    }
}
