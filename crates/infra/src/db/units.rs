use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use cafeteria_core::UnitId;
use cafeteria_products::{Unit, UnitDraft};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct UnitStore {
    pool: SqlitePool,
}

impl UnitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<Unit>> {
        sqlx::query("SELECT id, name, abbreviation FROM units ORDER BY id")
            .try_map(|row: SqliteRow| unit_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_units", e))
    }

    #[instrument(skip(self), fields(unit_id = %id), err)]
    pub async fn get(&self, id: UnitId) -> StoreResult<Unit> {
        sqlx::query("SELECT id, name, abbreviation FROM units WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| unit_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_unit", e))?
            .ok_or_else(|| StoreError::not_found("unit", id))
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, draft: UnitDraft) -> StoreResult<Unit> {
        let draft = draft.validate()?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO units (name, abbreviation) VALUES (?, ?) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.abbreviation)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_unit", e))?;

        Ok(Unit {
            id: UnitId::new(id),
            name: draft.name,
            abbreviation: draft.abbreviation,
        })
    }

    #[instrument(skip(self), fields(unit_id = %id), err)]
    pub async fn update(&self, id: UnitId, draft: UnitDraft) -> StoreResult<Unit> {
        let draft = draft.validate()?;
        let result = sqlx::query("UPDATE units SET name = ?, abbreviation = ? WHERE id = ?")
            .bind(&draft.name)
            .bind(&draft.abbreviation)
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_unit", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("unit", id));
        }
        Ok(Unit {
            id,
            name: draft.name,
            abbreviation: draft.abbreviation,
        })
    }

    #[instrument(skip(self), fields(unit_id = %id), err)]
    pub async fn delete(&self, id: UnitId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM units WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_unit", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("unit", id));
        }
        Ok(())
    }
}

pub(crate) fn unit_from_row(row: &SqliteRow) -> Result<Unit, sqlx::Error> {
    Ok(Unit {
        id: UnitId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        abbreviation: row.try_get("abbreviation")?,
    })
}
