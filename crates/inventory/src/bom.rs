use serde::{Deserialize, Serialize};

use cafeteria_core::{DishId, DomainError, DomainResult, ProductId};

/// One ingredient of a dish: `per_unit` of `product_id` per dish unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub product_id: ProductId,
    pub per_unit: i64,
}

/// Amount of a product needed for (or returned by) some number of dish units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub product_id: ProductId,
    pub amount: i64,
}

/// Static per-dish recipe: the products consumed by one unit of the dish.
///
/// Lines are kept ordered by product id so that every ledger operation visits
/// products in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillOfMaterials {
    dish_id: DishId,
    lines: Vec<IngredientLine>,
}

impl BillOfMaterials {
    pub fn new(dish_id: DishId, mut lines: Vec<IngredientLine>) -> Self {
        lines.sort_by_key(|l| l.product_id);
        Self { dish_id, lines }
    }

    pub fn dish_id(&self) -> DishId {
        self.dish_id
    }

    pub fn lines(&self) -> &[IngredientLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Expand `quantity` dish units into per-product amounts.
    ///
    /// `quantity` must be positive; an amount that does not fit in `i64` is a
    /// validation error rather than a wrapped value.
    pub fn requirements(&self, quantity: i64) -> DomainResult<Vec<Requirement>> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        self.lines
            .iter()
            .map(|line| {
                let amount = line.per_unit.checked_mul(quantity).ok_or_else(|| {
                    DomainError::validation(format!(
                        "quantity {quantity} overflows stock amount for product {}",
                        line.product_id
                    ))
                })?;
                Ok(Requirement {
                    product_id: line.product_id,
                    amount,
                })
            })
            .collect()
    }
}

/// A row of the availability snapshot: current stock for one ingredient of a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    pub available: i64,
    pub per_unit: i64,
}

/// First product that cannot cover the requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shortage {
    pub product_id: ProductId,
    pub required: i64,
    pub available: i64,
}

/// Check that every ingredient row can cover `quantity` dish units.
///
/// Rows are inspected in order and the first short one is reported. A required
/// amount too large for `i64` can never be covered and counts as a shortage.
/// Has no side effects.
pub fn check_availability(rows: &[StockLine], quantity: i64) -> Result<(), Shortage> {
    for row in rows {
        let required = row.per_unit.saturating_mul(quantity);
        if row.available < required {
            return Err(Shortage {
                product_id: row.product_id,
                required,
                available: row.available,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    const FLOUR: ProductId = ProductId::new(1);
    const MILK: ProductId = ProductId::new(2);
    const EGGS: ProductId = ProductId::new(3);

    fn pancakes() -> BillOfMaterials {
        BillOfMaterials::new(
            DishId::new(1),
            vec![
                IngredientLine { product_id: MILK, per_unit: 200 },
                IngredientLine { product_id: FLOUR, per_unit: 500 },
            ],
        )
    }

    fn snapshot(bom: &BillOfMaterials, stock: &HashMap<ProductId, i64>) -> Vec<StockLine> {
        bom.lines()
            .iter()
            .map(|l| StockLine {
                product_id: l.product_id,
                available: stock[&l.product_id],
                per_unit: l.per_unit,
            })
            .collect()
    }

    /// Reference application of a checked deduction: all-or-nothing.
    fn deduct(bom: &BillOfMaterials, stock: &mut HashMap<ProductId, i64>, qty: i64) -> bool {
        if check_availability(&snapshot(bom, stock), qty).is_err() {
            return false;
        }
        for r in bom.requirements(qty).unwrap() {
            *stock.get_mut(&r.product_id).unwrap() -= r.amount;
        }
        true
    }

    fn release(bom: &BillOfMaterials, stock: &mut HashMap<ProductId, i64>, qty: i64) {
        for r in bom.requirements(qty).unwrap() {
            *stock.get_mut(&r.product_id).unwrap() += r.amount;
        }
    }

    #[test]
    fn lines_are_ordered_by_product() {
        let ids: Vec<_> = pancakes().lines().iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![FLOUR, MILK]);
    }

    #[test]
    fn requirements_scale_per_unit_amounts() {
        let reqs = pancakes().requirements(50).unwrap();
        assert_eq!(
            reqs,
            vec![
                Requirement { product_id: FLOUR, amount: 25_000 },
                Requirement { product_id: MILK, amount: 10_000 },
            ]
        );
    }

    #[test]
    fn requirements_reject_non_positive_and_overflowing_quantities() {
        assert!(pancakes().requirements(0).is_err());
        assert!(pancakes().requirements(-1).is_err());
        assert!(pancakes().requirements(i64::MAX).is_err());
    }

    #[test]
    fn empty_recipe_needs_nothing() {
        let bom = BillOfMaterials::new(DishId::new(9), vec![]);
        assert!(bom.is_empty());
        assert!(bom.requirements(3).unwrap().is_empty());
        assert!(check_availability(&[], 1_000).is_ok());
    }

    #[test]
    fn check_reports_first_short_product() {
        let rows = [
            StockLine { product_id: FLOUR, available: 100_000, per_unit: 500 },
            StockLine { product_id: MILK, available: 1_000, per_unit: 200 },
        ];
        assert!(check_availability(&rows, 5).is_ok());
        assert_eq!(
            check_availability(&rows, 250),
            Err(Shortage { product_id: FLOUR, required: 125_000, available: 100_000 })
        );
        assert_eq!(
            check_availability(&rows, 6),
            Err(Shortage { product_id: MILK, required: 1_200, available: 1_000 })
        );
    }

    #[test]
    fn overflowing_requirement_is_a_shortage() {
        let rows = [StockLine { product_id: EGGS, available: i64::MAX - 1, per_unit: 2 }];
        assert!(check_availability(&rows, i64::MAX).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: deducting and then returning the same quantities restores stock exactly.
        #[test]
        fn deduct_then_release_conserves_stock(
            per_unit in prop::collection::vec(1i64..1_000, 1..4),
            qtys in prop::collection::vec(1i64..100, 1..10),
        ) {
            let lines: Vec<_> = per_unit
                .iter()
                .enumerate()
                .map(|(i, p)| IngredientLine { product_id: ProductId::new(i as i64 + 1), per_unit: *p })
                .collect();
            let bom = BillOfMaterials::new(DishId::new(1), lines);
            let initial: HashMap<_, _> = bom.lines().iter().map(|l| (l.product_id, 1_000_000i64)).collect();
            let mut stock = initial.clone();

            let mut applied = Vec::new();
            for q in &qtys {
                if deduct(&bom, &mut stock, *q) {
                    applied.push(*q);
                }
            }
            for q in applied.iter().rev() {
                release(&bom, &mut stock, *q);
            }

            prop_assert_eq!(stock, initial);
        }

        /// Property: checked deductions never drive any product negative, and a
        /// rejected deduction leaves every product untouched.
        #[test]
        fn checked_deductions_never_go_negative(
            per_unit in prop::collection::vec(1i64..500, 1..4),
            initial in prop::collection::vec(0i64..10_000, 4),
            qtys in prop::collection::vec(1i64..50, 1..20),
        ) {
            let lines: Vec<_> = per_unit
                .iter()
                .enumerate()
                .map(|(i, p)| IngredientLine { product_id: ProductId::new(i as i64 + 1), per_unit: *p })
                .collect();
            let bom = BillOfMaterials::new(DishId::new(1), lines);
            let mut stock: HashMap<_, _> = bom
                .lines()
                .iter()
                .zip(initial.iter())
                .map(|(l, q)| (l.product_id, *q))
                .collect();

            for q in qtys {
                let before = stock.clone();
                let ok = deduct(&bom, &mut stock, q);
                if !ok {
                    prop_assert_eq!(&stock, &before);
                }
                prop_assert!(stock.values().all(|v| *v >= 0));
            }
        }
    }
}
