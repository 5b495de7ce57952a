use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use cafeteria_core::{DishId, OrderId, OrderItemId, TableId};
use cafeteria_menu::Dish;
use cafeteria_orders::{Order, OrderDetails, OrderDraft, OrderItem, OrderLine, OrderStatus};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

/// Orders and read access to their line items.
///
/// Anything that changes line items or removes an order moves stock, so those
/// writes live on [`crate::InventoryLedger`].
#[derive(Debug, Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

impl OrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<Order>> {
        sqlx::query("SELECT id, table_id, order_time, status FROM orders ORDER BY id")
            .try_map(|row: SqliteRow| order_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn get(&self, id: OrderId) -> StoreResult<Order> {
        sqlx::query("SELECT id, table_id, order_time, status FROM orders WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| order_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    /// The order with each line joined to its dish.
    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn details(&self, id: OrderId) -> StoreResult<OrderDetails> {
        let order = self.get(id).await?;
        let items = sqlx::query(
            r#"
            SELECT
                oi.id,
                oi.order_id,
                oi.quantity,
                d.id AS dish_id,
                d.name AS dish_name,
                d.description AS dish_description,
                d.price AS dish_price
            FROM order_items oi
            JOIN dishes d ON d.id = oi.dish_id
            WHERE oi.order_id = ?
            ORDER BY oi.id
            "#,
        )
        .bind(id.get())
        .try_map(|row: SqliteRow| order_line_from_row(&row))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_order_lines", e))?;

        Ok(OrderDetails { order, items })
    }

    /// Open a new order for a table; `order_time` is now.
    #[instrument(skip(self), fields(table_id = %draft.table_id), err)]
    pub async fn create(&self, draft: OrderDraft) -> StoreResult<Order> {
        self.ensure_table(draft.table_id).await?;
        let order_time = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (table_id, order_time, status) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(draft.table_id.get())
        .bind(order_time)
        .bind(draft.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        Ok(Order {
            id: OrderId::new(id),
            table_id: draft.table_id,
            order_time,
            status: draft.status,
        })
    }

    /// Move the order to another table and/or status. Line items are untouched.
    #[instrument(skip(self), fields(order_id = %id), err)]
    pub async fn update(&self, id: OrderId, draft: OrderDraft) -> StoreResult<Order> {
        self.ensure_table(draft.table_id).await?;
        let result = sqlx::query("UPDATE orders SET table_id = ?, status = ? WHERE id = ?")
            .bind(draft.table_id.get())
            .bind(draft.status.as_str())
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id));
        }
        self.get(id).await
    }

    pub async fn list_items(&self) -> StoreResult<Vec<OrderItem>> {
        sqlx::query("SELECT id, order_id, dish_id, quantity FROM order_items ORDER BY id")
            .try_map(|row: SqliteRow| order_item_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_order_items", e))
    }

    #[instrument(skip(self), fields(order_item_id = %id), err)]
    pub async fn get_item(&self, id: OrderItemId) -> StoreResult<OrderItem> {
        sqlx::query("SELECT id, order_id, dish_id, quantity FROM order_items WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| order_item_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order_item", e))?
            .ok_or_else(|| StoreError::not_found("order item", id))
    }

    async fn ensure_table(&self, id: TableId) -> StoreResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM tables WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_table", e))?;
        exists
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("table", id))
    }
}

fn order_from_row(row: &SqliteRow) -> Result<Order, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(Order {
        id: OrderId::new(row.try_get("id")?),
        table_id: TableId::new(row.try_get("table_id")?),
        order_time: row.try_get("order_time")?,
        status,
    })
}

pub(crate) fn order_item_from_row(row: &SqliteRow) -> Result<OrderItem, sqlx::Error> {
    Ok(OrderItem {
        id: OrderItemId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        dish_id: DishId::new(row.try_get("dish_id")?),
        quantity: row.try_get("quantity")?,
    })
}

fn order_line_from_row(row: &SqliteRow) -> Result<OrderLine, sqlx::Error> {
    Ok(OrderLine {
        id: OrderItemId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        quantity: row.try_get("quantity")?,
        dish: Dish {
            id: DishId::new(row.try_get("dish_id")?),
            name: row.try_get("dish_name")?,
            description: row.try_get("dish_description")?,
            price: row.try_get("dish_price")?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{TableStore, testing};
    use cafeteria_orders::TableDraft;

    async fn setup() -> (OrderStore, TableId) {
        let pool = testing::pool().await;
        let table = TableStore::new(pool.clone())
            .create(TableDraft {
                number: 1,
                capacity: 4,
            })
            .await
            .unwrap();
        (OrderStore::new(pool), table.id)
    }

    #[tokio::test]
    async fn new_order_defaults_to_pending_and_reads_back() {
        let (store, table_id) = setup().await;
        let order = store
            .create(OrderDraft {
                table_id,
                status: OrderStatus::default(),
            })
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        let details = store.details(order.id).await.unwrap();
        assert_eq!(details.order.id, order.id);
        assert_eq!(details.order.status, OrderStatus::Pending);
        assert!(details.items.is_empty());
    }

    #[tokio::test]
    async fn order_for_unknown_table_is_not_found() {
        let (store, _) = setup().await;
        let err = store
            .create(OrderDraft {
                table_id: TableId::new(99),
                status: OrderStatus::Pending,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "table", id: 99 }));
    }

    #[tokio::test]
    async fn update_changes_status() {
        let (store, table_id) = setup().await;
        let order = store
            .create(OrderDraft {
                table_id,
                status: OrderStatus::Pending,
            })
            .await
            .unwrap();
        let updated = store
            .update(
                order.id,
                OrderDraft {
                    table_id,
                    status: OrderStatus::Served,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Served);
        assert_eq!(store.list().await.unwrap(), vec![updated]);
    }
}
