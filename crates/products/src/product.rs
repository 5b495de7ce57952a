use serde::{Deserialize, Serialize};

use cafeteria_core::{require_name, DomainError, DomainResult, ProductId, UnitId};

use crate::Unit;

/// A raw product held in stock.
///
/// `quantity` is the stock on hand, already scaled to the product's unit.
/// It never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_id: UnitId,
}

/// Product joined with its unit, the shape returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductWithUnit {
    #[serde(flatten)]
    pub product: Product,
    pub unit: Unit,
}

/// Unauthenticated view of a product: availability without exact stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProduct {
    pub id: ProductId,
    pub name: String,
    pub unit: String,
    pub in_stock: bool,
}

impl From<ProductWithUnit> for PublicProduct {
    fn from(value: ProductWithUnit) -> Self {
        Self {
            id: value.product.id,
            name: value.product.name,
            unit: value.unit.abbreviation,
            in_stock: value.product.quantity > 0,
        }
    }
}

/// Product fields as submitted for create/replace (administrative CRUD).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub quantity: i64,
    pub unit_id: UnitId,
}

impl ProductDraft {
    pub fn validate(self) -> DomainResult<Self> {
        let name = require_name("name", &self.name)?;
        if self.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self { name, ..self })
    }
}
