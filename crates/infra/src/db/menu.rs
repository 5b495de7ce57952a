use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use cafeteria_core::{DishId, MenuItemId};
use cafeteria_menu::{MenuItem, MenuItemDraft};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct MenuStore {
    pool: SqlitePool,
}

impl MenuStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<MenuItem>> {
        sqlx::query("SELECT id, dish_id, available FROM menu ORDER BY id")
            .try_map(|row: SqliteRow| menu_item_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_menu", e))
    }

    #[instrument(skip(self), fields(menu_item_id = %id), err)]
    pub async fn get(&self, id: MenuItemId) -> StoreResult<MenuItem> {
        sqlx::query("SELECT id, dish_id, available FROM menu WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| menu_item_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_menu_item", e))?
            .ok_or_else(|| StoreError::not_found("menu item", id))
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, draft: MenuItemDraft) -> StoreResult<MenuItem> {
        self.ensure_dish(draft.dish_id).await?;
        let id: i64 =
            sqlx::query_scalar("INSERT INTO menu (dish_id, available) VALUES (?, ?) RETURNING id")
                .bind(draft.dish_id.get())
                .bind(draft.available)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("create_menu_item", e))?;

        Ok(MenuItem {
            id: MenuItemId::new(id),
            dish_id: draft.dish_id,
            available: draft.available,
        })
    }

    #[instrument(skip(self), fields(menu_item_id = %id), err)]
    pub async fn update(&self, id: MenuItemId, draft: MenuItemDraft) -> StoreResult<MenuItem> {
        self.ensure_dish(draft.dish_id).await?;
        let result = sqlx::query("UPDATE menu SET dish_id = ?, available = ? WHERE id = ?")
            .bind(draft.dish_id.get())
            .bind(draft.available)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_menu_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("menu item", id));
        }
        Ok(MenuItem {
            id,
            dish_id: draft.dish_id,
            available: draft.available,
        })
    }

    #[instrument(skip(self), fields(menu_item_id = %id), err)]
    pub async fn delete(&self, id: MenuItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM menu WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_menu_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("menu item", id));
        }
        Ok(())
    }

    async fn ensure_dish(&self, id: DishId) -> StoreResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM dishes WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_dish", e))?;
        exists
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("dish", id))
    }
}

fn menu_item_from_row(row: &SqliteRow) -> Result<MenuItem, sqlx::Error> {
    Ok(MenuItem {
        id: MenuItemId::new(row.try_get("id")?),
        dish_id: DishId::new(row.try_get("dish_id")?),
        available: row.try_get("available")?,
    })
}
