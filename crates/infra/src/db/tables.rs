use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use cafeteria_core::TableId;
use cafeteria_orders::{Table, TableDraft};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct TableStore {
    pool: SqlitePool,
}

impl TableStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<Table>> {
        sqlx::query("SELECT id, number, capacity FROM tables ORDER BY number")
            .try_map(|row: SqliteRow| table_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tables", e))
    }

    #[instrument(skip(self), fields(table_id = %id), err)]
    pub async fn get(&self, id: TableId) -> StoreResult<Table> {
        sqlx::query("SELECT id, number, capacity FROM tables WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| table_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_table", e))?
            .ok_or_else(|| StoreError::not_found("table", id))
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, draft: TableDraft) -> StoreResult<Table> {
        let draft = draft.validate()?;
        let id: i64 =
            sqlx::query_scalar("INSERT INTO tables (number, capacity) VALUES (?, ?) RETURNING id")
                .bind(draft.number)
                .bind(draft.capacity)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("create_table", e))?;

        Ok(Table {
            id: TableId::new(id),
            number: draft.number,
            capacity: draft.capacity,
        })
    }

    #[instrument(skip(self), fields(table_id = %id), err)]
    pub async fn update(&self, id: TableId, draft: TableDraft) -> StoreResult<Table> {
        let draft = draft.validate()?;
        let result = sqlx::query("UPDATE tables SET number = ?, capacity = ? WHERE id = ?")
            .bind(draft.number)
            .bind(draft.capacity)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_table", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("table", id));
        }
        Ok(Table {
            id,
            number: draft.number,
            capacity: draft.capacity,
        })
    }

    /// A table with orders on record cannot be deleted.
    #[instrument(skip(self), fields(table_id = %id), err)]
    pub async fn delete(&self, id: TableId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tables WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_table", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("table", id));
        }
        Ok(())
    }
}

fn table_from_row(row: &SqliteRow) -> Result<Table, sqlx::Error> {
    Ok(Table {
        id: TableId::new(row.try_get("id")?),
        number: row.try_get("number")?,
        capacity: row.try_get("capacity")?,
    })
}
