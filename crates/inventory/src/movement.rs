use serde::{Deserialize, Serialize};

/// Stock effect of changing an order line from one quantity to another.
///
/// Quantities are in dish units; the bill of materials turns them into
/// per-product amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "quantity", rename_all = "snake_case")]
pub enum StockMovement {
    /// Same quantity: nothing to do.
    Unchanged,
    /// Quantity grew: check availability, then deduct this many dish units.
    Consume(i64),
    /// Quantity shrank (or the line went away): return this many dish units.
    Release(i64),
}

impl StockMovement {
    pub fn between(old_quantity: i64, new_quantity: i64) -> Self {
        let delta = new_quantity - old_quantity;
        match delta {
            0 => StockMovement::Unchanged,
            d if d > 0 => StockMovement::Consume(d),
            d => StockMovement::Release(-d),
        }
    }

    /// Signed dish-unit delta (positive consumes stock).
    pub fn delta(&self) -> i64 {
        match *self {
            StockMovement::Unchanged => 0,
            StockMovement::Consume(q) => q,
            StockMovement::Release(q) => -q,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_quantity_changes() {
        assert_eq!(StockMovement::between(50, 50), StockMovement::Unchanged);
        assert_eq!(StockMovement::between(0, 50), StockMovement::Consume(50));
        assert_eq!(StockMovement::between(50, 10), StockMovement::Release(40));
        assert_eq!(StockMovement::between(10, 0), StockMovement::Release(10));
    }

    #[test]
    fn delta_is_signed_difference() {
        assert_eq!(StockMovement::between(3, 8).delta(), 5);
        assert_eq!(StockMovement::between(8, 3).delta(), -5);
        assert_eq!(StockMovement::Unchanged.delta(), 0);
    }
}
