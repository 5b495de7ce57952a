use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use cafeteria_core::{ProductId, UnitId};
use cafeteria_products::{Product, ProductDraft, ProductWithUnit, PublicProduct, Unit};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

const SELECT_WITH_UNIT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.quantity,
        p.unit_id,
        u.name AS unit_name,
        u.abbreviation AS unit_abbreviation
    FROM products p
    JOIN units u ON u.id = p.unit_id
"#;

/// Product catalog. Stock changes driven by orders go through
/// [`crate::InventoryLedger`]; this store only replaces whole rows.
#[derive(Debug, Clone)]
pub struct ProductStore {
    pool: SqlitePool,
}

impl ProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<ProductWithUnit>> {
        sqlx::query(&format!("{SELECT_WITH_UNIT} ORDER BY p.id"))
            .try_map(|row: SqliteRow| product_with_unit_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))
    }

    /// Unauthenticated listing: availability only.
    pub async fn list_public(&self) -> StoreResult<Vec<PublicProduct>> {
        Ok(self.list().await?.into_iter().map(PublicProduct::from).collect())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn get(&self, id: ProductId) -> StoreResult<ProductWithUnit> {
        sqlx::query(&format!("{SELECT_WITH_UNIT} WHERE p.id = ?"))
            .bind(id.get())
            .try_map(|row: SqliteRow| product_with_unit_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, draft: ProductDraft) -> StoreResult<ProductWithUnit> {
        let draft = draft.validate()?;
        self.ensure_unit(draft.unit_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, quantity, unit_id) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&draft.name)
        .bind(draft.quantity)
        .bind(draft.unit_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        self.get(ProductId::new(id)).await
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn update(&self, id: ProductId, draft: ProductDraft) -> StoreResult<ProductWithUnit> {
        let draft = draft.validate()?;
        self.ensure_unit(draft.unit_id).await?;

        let result =
            sqlx::query("UPDATE products SET name = ?, quantity = ?, unit_id = ? WHERE id = ?")
                .bind(&draft.name)
                .bind(draft.quantity)
                .bind(draft.unit_id.get())
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        self.get(id).await
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    pub async fn delete(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }
        Ok(())
    }

    async fn ensure_unit(&self, id: UnitId) -> StoreResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM units WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_unit", e))?;
        exists
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("unit", id))
    }
}

fn product_with_unit_from_row(row: &SqliteRow) -> Result<ProductWithUnit, sqlx::Error> {
    let unit_id = UnitId::new(row.try_get("unit_id")?);
    Ok(ProductWithUnit {
        product: Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
            unit_id,
        },
        unit: Unit {
            id: unit_id,
            name: row.try_get("unit_name")?,
            abbreviation: row.try_get("unit_abbreviation")?,
        },
    })
}
