//! Inventory ledger: keeps product stock consistent with order lines.
//!
//! The free functions operate on a connection that the caller has already put
//! inside a transaction; they never commit. [`InventoryLedger`] opens one
//! `BEGIN IMMEDIATE` transaction per composite operation, so the availability
//! read, the stock writes and the order-row mutation commit together or not at
//! all. A transaction dropped on an error path rolls back.
//!
//! The upfront availability check only exits early. The conditional
//! `UPDATE ... WHERE quantity >= ?` is what guarantees stock never goes
//! negative; when it matches no row the deduction fails with `RaceLost`.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, instrument, warn};

use cafeteria_core::{DishId, DomainError, OrderId, OrderItemId, ProductId};
use cafeteria_inventory::{BillOfMaterials, IngredientLine, StockLine, StockMovement};
use cafeteria_orders::{OrderItem, validate_line_quantity};

use crate::db::orders::order_item_from_row;
use crate::error::{StoreError, StoreResult, map_sqlx_error};

// ─────────────────────────────────────────────────────────────────────────────
// Ledger primitives (caller-owned transaction)
// ─────────────────────────────────────────────────────────────────────────────

/// Fail with `InsufficientStock` on the first ingredient whose stock cannot
/// cover `quantity` units of the dish. No side effects.
pub async fn check_availability(
    conn: &mut SqliteConnection,
    dish_id: DishId,
    quantity: i64,
) -> StoreResult<()> {
    let rows = sqlx::query(
        r#"
        SELECT
            di.product_id,
            di.quantity AS per_unit,
            p.quantity AS available
        FROM dish_ingredients di
        JOIN products p ON p.id = di.product_id
        WHERE di.dish_id = ?
        ORDER BY di.product_id
        "#,
    )
    .bind(dish_id.get())
    .try_map(|row: SqliteRow| {
        Ok(StockLine {
            product_id: ProductId::new(row.try_get("product_id")?),
            available: row.try_get("available")?,
            per_unit: row.try_get("per_unit")?,
        })
    })
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("check_availability", e))?;

    cafeteria_inventory::check_availability(&rows, quantity).map_err(|shortage| {
        warn!(
            dish_id = %dish_id,
            product_id = %shortage.product_id,
            required = shortage.required,
            available = shortage.available,
            "insufficient stock"
        );
        StoreError::InsufficientStock {
            product_id: shortage.product_id,
        }
    })
}

/// Subtract the dish's requirements for `quantity` units, re-checking each
/// product's stock at write time.
pub async fn deduct(conn: &mut SqliteConnection, dish_id: DishId, quantity: i64) -> StoreResult<()> {
    let bom = load_bill_of_materials(conn, dish_id).await?;
    for requirement in bom.requirements(quantity)? {
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity - ? WHERE id = ? AND quantity >= ?",
        )
        .bind(requirement.amount)
        .bind(requirement.product_id.get())
        .bind(requirement.amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("deduct_stock", e))?;

        if result.rows_affected() == 0 {
            warn!(
                dish_id = %dish_id,
                product_id = %requirement.product_id,
                amount = requirement.amount,
                "conditional deduction matched no row"
            );
            return Err(StoreError::RaceLost {
                product_id: requirement.product_id,
            });
        }
        debug!(product_id = %requirement.product_id, amount = requirement.amount, "stock deducted");
    }
    Ok(())
}

/// Add back the dish's requirements for `quantity` units. Fails only when a
/// product is gone or its stock would leave the `i64` range.
pub async fn return_stock(
    conn: &mut SqliteConnection,
    dish_id: DishId,
    quantity: i64,
) -> StoreResult<()> {
    let bom = load_bill_of_materials(conn, dish_id).await?;
    for requirement in bom.requirements(quantity)? {
        let result = sqlx::query(
            "UPDATE products SET quantity = quantity + ? WHERE id = ? AND quantity <= ?",
        )
        .bind(requirement.amount)
        .bind(requirement.product_id.get())
        .bind(i64::MAX - requirement.amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("return_stock", e))?;

        if result.rows_affected() == 0 {
            ensure_exists(
                conn,
                "SELECT id FROM products WHERE id = ?",
                "product",
                requirement.product_id.get(),
            )
            .await?;
            warn!(product_id = %requirement.product_id, amount = requirement.amount, "returned stock would overflow");
            return Err(stock_overflow(requirement.product_id));
        }
        debug!(product_id = %requirement.product_id, amount = requirement.amount, "stock returned");
    }
    Ok(())
}

/// Move stock for an order line changing from `old_quantity` to
/// `new_quantity` units of the dish.
pub async fn apply_delta(
    conn: &mut SqliteConnection,
    dish_id: DishId,
    old_quantity: i64,
    new_quantity: i64,
) -> StoreResult<StockMovement> {
    let movement = StockMovement::between(old_quantity, new_quantity);
    match movement {
        StockMovement::Unchanged => {}
        StockMovement::Consume(units) => {
            check_availability(conn, dish_id, units).await?;
            deduct(conn, dish_id, units).await?;
        }
        StockMovement::Release(units) => {
            return_stock(conn, dish_id, units).await?;
        }
    }
    Ok(movement)
}

async fn load_bill_of_materials(
    conn: &mut SqliteConnection,
    dish_id: DishId,
) -> StoreResult<BillOfMaterials> {
    let lines = sqlx::query(
        "SELECT product_id, quantity FROM dish_ingredients WHERE dish_id = ? ORDER BY product_id",
    )
    .bind(dish_id.get())
    .try_map(|row: SqliteRow| {
        Ok(IngredientLine {
            product_id: ProductId::new(row.try_get("product_id")?),
            per_unit: row.try_get("quantity")?,
        })
    })
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("load_bill_of_materials", e))?;

    Ok(BillOfMaterials::new(dish_id, lines))
}

async fn ensure_exists(
    conn: &mut SqliteConnection,
    sql: &'static str,
    entity: &'static str,
    id: i64,
) -> StoreResult<()> {
    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("ensure_exists", e))?;
    found
        .map(|_| ())
        .ok_or_else(|| StoreError::not_found(entity, id))
}

fn stock_overflow(product_id: ProductId) -> StoreError {
    DomainError::validation(format!("stock of product {product_id} would overflow")).into()
}

// ─────────────────────────────────────────────────────────────────────────────
// Composite operations
// ─────────────────────────────────────────────────────────────────────────────

/// Transactional entry point for every write that moves stock.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Take SQLite's write lock up front so no other writer can change stock
    /// between the availability read and the deduction.
    async fn begin(&self) -> StoreResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn commit(tx: Transaction<'static, Sqlite>) -> StoreResult<()> {
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    /// Add `quantity` units of a dish to an order. An existing line for the
    /// same dish grows by `quantity` instead of getting a sibling.
    #[instrument(skip(self), fields(order_id = %order_id, dish_id = %dish_id), err)]
    pub async fn create_order_item(
        &self,
        order_id: OrderId,
        dish_id: DishId,
        quantity: i64,
    ) -> StoreResult<OrderItem> {
        let quantity = validate_line_quantity(quantity)?;
        let mut tx = self.begin().await?;

        ensure_exists(&mut tx, "SELECT id FROM orders WHERE id = ?", "order", order_id.get()).await?;
        ensure_exists(&mut tx, "SELECT id FROM dishes WHERE id = ?", "dish", dish_id.get()).await?;

        let existing = sqlx::query(
            "SELECT id, order_id, dish_id, quantity FROM order_items WHERE order_id = ? AND dish_id = ?",
        )
        .bind(order_id.get())
        .bind(dish_id.get())
        .try_map(|row: SqliteRow| order_item_from_row(&row))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("find_order_item", e))?;

        let item = match existing {
            Some(mut item) => {
                let merged = item.quantity.checked_add(quantity).ok_or_else(|| {
                    DomainError::validation("order line quantity is too large")
                })?;
                apply_delta(&mut tx, dish_id, item.quantity, merged).await?;
                sqlx::query("UPDATE order_items SET quantity = ? WHERE id = ?")
                    .bind(merged)
                    .bind(item.id.get())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("merge_order_item", e))?;
                item.quantity = merged;
                item
            }
            None => {
                apply_delta(&mut tx, dish_id, 0, quantity).await?;
                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO order_items (order_id, dish_id, quantity) VALUES (?, ?, ?) RETURNING id",
                )
                .bind(order_id.get())
                .bind(dish_id.get())
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_order_item", e))?;
                OrderItem {
                    id: OrderItemId::new(id),
                    order_id,
                    dish_id,
                    quantity,
                }
            }
        };

        Self::commit(tx).await?;
        debug!(order_item_id = %item.id, quantity = item.quantity, "order line saved");
        Ok(item)
    }

    /// Set a line's quantity. The dish comes from the stored line; a line
    /// never changes dish.
    #[instrument(skip(self), fields(order_item_id = %item_id), err)]
    pub async fn update_order_item(
        &self,
        item_id: OrderItemId,
        quantity: i64,
    ) -> StoreResult<OrderItem> {
        let quantity = validate_line_quantity(quantity)?;
        let mut tx = self.begin().await?;

        let mut item = sqlx::query(
            "SELECT id, order_id, dish_id, quantity FROM order_items WHERE id = ?",
        )
        .bind(item_id.get())
        .try_map(|row: SqliteRow| order_item_from_row(&row))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("find_order_item", e))?
        .ok_or_else(|| StoreError::not_found("order item", item_id))?;

        apply_delta(&mut tx, item.dish_id, item.quantity, quantity).await?;
        sqlx::query("UPDATE order_items SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(item_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order_item", e))?;

        Self::commit(tx).await?;
        item.quantity = quantity;
        Ok(item)
    }

    /// Remove a line and return its ingredients. Deleting a line that is
    /// already gone is `NotFound` and credits nothing.
    #[instrument(skip(self), fields(order_item_id = %item_id), err)]
    pub async fn delete_order_item(&self, item_id: OrderItemId) -> StoreResult<OrderItem> {
        let mut tx = self.begin().await?;

        let item = sqlx::query(
            "DELETE FROM order_items WHERE id = ? RETURNING id, order_id, dish_id, quantity",
        )
        .bind(item_id.get())
        .try_map(|row: SqliteRow| order_item_from_row(&row))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_order_item", e))?
        .ok_or_else(|| StoreError::not_found("order item", item_id))?;

        return_stock(&mut tx, item.dish_id, item.quantity).await?;

        Self::commit(tx).await?;
        Ok(item)
    }

    /// Return the ingredients of every line, then delete the order (its lines
    /// cascade). Yields the removed lines.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub async fn delete_order(&self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let mut tx = self.begin().await?;

        ensure_exists(&mut tx, "SELECT id FROM orders WHERE id = ?", "order", order_id.get()).await?;

        let items = sqlx::query(
            "SELECT id, order_id, dish_id, quantity FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id.get())
        .try_map(|row: SqliteRow| order_item_from_row(&row))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("list_order_items", e))?;

        for item in &items {
            return_stock(&mut tx, item.dish_id, item.quantity).await?;
        }

        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;

        Self::commit(tx).await?;
        debug!(released_lines = items.len(), "order deleted");
        Ok(items)
    }

    /// Administrative stock correction by a signed `delta`. A result below
    /// zero is refused with `InsufficientStock`. Returns the new quantity.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> StoreResult<i64> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero").into());
        }
        let amount = delta
            .checked_abs()
            .ok_or_else(|| DomainError::validation("delta is out of range"))?;

        let mut tx = self.begin().await?;
        let result = if delta > 0 {
            sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE products SET quantity = quantity + ?
                WHERE id = ? AND quantity <= ?
                RETURNING quantity
                "#,
            )
            .bind(amount)
            .bind(product_id.get())
            .bind(i64::MAX - amount)
            .fetch_optional(&mut *tx)
            .await
        } else {
            sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE products SET quantity = quantity - ?
                WHERE id = ? AND quantity >= ?
                RETURNING quantity
                "#,
            )
            .bind(amount)
            .bind(product_id.get())
            .bind(amount)
            .fetch_optional(&mut *tx)
            .await
        };
        let updated = result.map_err(|e| map_sqlx_error("adjust_stock", e))?;

        let Some(quantity) = updated else {
            ensure_exists(&mut tx, "SELECT id FROM products WHERE id = ?", "product", product_id.get())
                .await?;
            if delta > 0 {
                warn!(product_id = %product_id, delta, "stock adjustment would overflow");
                return Err(stock_overflow(product_id));
            }
            warn!(product_id = %product_id, delta, "stock adjustment would go negative");
            return Err(StoreError::InsufficientStock { product_id });
        };

        Self::commit(tx).await?;
        debug!(product_id = %product_id, delta, quantity, "stock adjusted");
        Ok(quantity)
    }
}
