use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafeteria_core::{DishId, DomainError, DomainResult, OrderId, OrderItemId, TableId};
use cafeteria_menu::Dish;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Served,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Served => "served",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "in_progress" => Ok(OrderStatus::InProgress),
            "served" => Ok(OrderStatus::Served),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status '{other}'"))),
        }
    }
}

/// An order placed for a table. Owns its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub table_id: TableId,
    pub order_time: DateTime<Utc>,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderDraft {
    pub table_id: TableId,
    #[serde(default)]
    pub status: OrderStatus,
}

/// A line item: how many units of a dish are on an order.
///
/// `quantity` is the live multiplier applied against the dish's bill of
/// materials; it is always at least 1 while the row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub dish_id: DishId,
    pub quantity: i64,
}

/// Line item joined with its dish for detailed order views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub dish: Dish,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

impl OrderDetails {
    /// Order total in the smallest currency unit.
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .map(|line| line.dish.price.saturating_mul(line.quantity))
            .fold(0i64, i64::saturating_add)
    }
}

/// Line quantities must be at least one; removing a dish is a delete.
pub fn validate_line_quantity(quantity: i64) -> DomainResult<i64> {
    if quantity < 1 {
        return Err(DomainError::validation("quantity must be at least 1"));
    }
    Ok(quantity)
}
