use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{instrument, warn};

use cafeteria_core::{DishId, DishIngredientId, ProductId};
use cafeteria_menu::{Dish, DishDraft, DishIngredient, DishIngredientDraft};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct DishStore {
    pool: SqlitePool,
}

impl DishStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<Dish>> {
        sqlx::query("SELECT id, name, description, price FROM dishes ORDER BY id")
            .try_map(|row: SqliteRow| dish_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_dishes", e))
    }

    #[instrument(skip(self), fields(dish_id = %id), err)]
    pub async fn get(&self, id: DishId) -> StoreResult<Dish> {
        sqlx::query("SELECT id, name, description, price FROM dishes WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| dish_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_dish", e))?
            .ok_or_else(|| StoreError::not_found("dish", id))
    }

    #[instrument(skip(self), err)]
    pub async fn create(&self, draft: DishDraft) -> StoreResult<Dish> {
        let draft = draft.validate()?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO dishes (name, description, price) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_dish", e))?;

        Ok(Dish {
            id: DishId::new(id),
            name: draft.name,
            description: draft.description,
            price: draft.price,
        })
    }

    #[instrument(skip(self), fields(dish_id = %id), err)]
    pub async fn update(&self, id: DishId, draft: DishDraft) -> StoreResult<Dish> {
        let draft = draft.validate()?;
        let result =
            sqlx::query("UPDATE dishes SET name = ?, description = ?, price = ? WHERE id = ?")
                .bind(&draft.name)
                .bind(&draft.description)
                .bind(draft.price)
                .bind(id.get())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_dish", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("dish", id));
        }
        Ok(Dish {
            id,
            name: draft.name,
            description: draft.description,
            price: draft.price,
        })
    }

    /// Deletes the dish with its recipe and menu entries. A dish still on an
    /// order cannot be deleted.
    #[instrument(skip(self), fields(dish_id = %id), err)]
    pub async fn delete(&self, id: DishId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM dishes WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_dish", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("dish", id));
        }
        Ok(())
    }

    /// The dish's bill of materials, ordered by product.
    #[instrument(skip(self), fields(dish_id = %id), err)]
    pub async fn ingredients(&self, id: DishId) -> StoreResult<Vec<DishIngredient>> {
        self.get(id).await?;
        sqlx::query(
            r#"
            SELECT id, dish_id, product_id, quantity
            FROM dish_ingredients
            WHERE dish_id = ?
            ORDER BY product_id
            "#,
        )
        .bind(id.get())
        .try_map(|row: SqliteRow| ingredient_from_row(&row))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_dish_ingredients", e))
    }
}

/// Bill-of-materials rows. Read-only from the ledger's point of view.
#[derive(Debug, Clone)]
pub struct DishIngredientStore {
    pool: SqlitePool,
}

impl DishIngredientStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<DishIngredient>> {
        sqlx::query("SELECT id, dish_id, product_id, quantity FROM dish_ingredients ORDER BY id")
            .try_map(|row: SqliteRow| ingredient_from_row(&row))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_ingredients", e))
    }

    #[instrument(skip(self), fields(ingredient_id = %id), err)]
    pub async fn get(&self, id: DishIngredientId) -> StoreResult<DishIngredient> {
        sqlx::query("SELECT id, dish_id, product_id, quantity FROM dish_ingredients WHERE id = ?")
            .bind(id.get())
            .try_map(|row: SqliteRow| ingredient_from_row(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_ingredient", e))?
            .ok_or_else(|| StoreError::not_found("dish ingredient", id))
    }

    /// Add a recipe line. Refused while the dish sits on any order.
    #[instrument(skip(self), err)]
    pub async fn create(&self, draft: DishIngredientDraft) -> StoreResult<DishIngredient> {
        let draft = draft.validate()?;
        let mut tx = self.begin().await?;
        ensure_refs(&mut tx, draft.dish_id, draft.product_id).await?;
        ensure_recipe_unlocked(&mut tx, draft.dish_id).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO dish_ingredients (dish_id, product_id, quantity)
            VALUES (?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(draft.dish_id.get())
        .bind(draft.product_id.get())
        .bind(draft.quantity)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_ingredient", e))?;

        Self::commit(tx).await?;
        Ok(DishIngredient {
            id: DishIngredientId::new(id),
            dish_id: draft.dish_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
        })
    }

    /// Replace a recipe line. Both the current and the target dish must be
    /// off every order.
    #[instrument(skip(self), fields(ingredient_id = %id), err)]
    pub async fn update(
        &self,
        id: DishIngredientId,
        draft: DishIngredientDraft,
    ) -> StoreResult<DishIngredient> {
        let draft = draft.validate()?;
        let mut tx = self.begin().await?;

        let current = stored_dish_of(&mut tx, id).await?;
        ensure_refs(&mut tx, draft.dish_id, draft.product_id).await?;
        ensure_recipe_unlocked(&mut tx, current).await?;
        if current != draft.dish_id {
            ensure_recipe_unlocked(&mut tx, draft.dish_id).await?;
        }

        sqlx::query(
            "UPDATE dish_ingredients SET dish_id = ?, product_id = ?, quantity = ? WHERE id = ?",
        )
        .bind(draft.dish_id.get())
        .bind(draft.product_id.get())
        .bind(draft.quantity)
        .bind(id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_ingredient", e))?;

        Self::commit(tx).await?;
        Ok(DishIngredient {
            id,
            dish_id: draft.dish_id,
            product_id: draft.product_id,
            quantity: draft.quantity,
        })
    }

    #[instrument(skip(self), fields(ingredient_id = %id), err)]
    pub async fn delete(&self, id: DishIngredientId) -> StoreResult<()> {
        let mut tx = self.begin().await?;

        let dish_id = stored_dish_of(&mut tx, id).await?;
        ensure_recipe_unlocked(&mut tx, dish_id).await?;

        sqlx::query("DELETE FROM dish_ingredients WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_ingredient", e))?;

        Self::commit(tx).await
    }

    /// Same write lock the ledger takes, so no order line for the dish can
    /// appear between the check and the recipe change.
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
}

async fn stored_dish_of(conn: &mut SqliteConnection, id: DishIngredientId) -> StoreResult<DishId> {
    let dish_id: Option<i64> =
        sqlx::query_scalar("SELECT dish_id FROM dish_ingredients WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("get_ingredient", e))?;
    dish_id
        .map(DishId::new)
        .ok_or_else(|| StoreError::not_found("dish ingredient", id))
}

async fn ensure_refs(
    conn: &mut SqliteConnection,
    dish_id: DishId,
    product_id: ProductId,
) -> StoreResult<()> {
    let row = sqlx::query(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM dishes WHERE id = ?) AS dish_found,
            EXISTS (SELECT 1 FROM products WHERE id = ?) AS product_found
        "#,
    )
    .bind(dish_id.get())
    .bind(product_id.get())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("check_ingredient_refs", e))?;

    let found = |column: &str| -> StoreResult<bool> {
        row.try_get::<i64, _>(column)
            .map(|flag| flag != 0)
            .map_err(|e| map_sqlx_error("check_ingredient_refs", e))
    };
    if !found("dish_found")? {
        return Err(StoreError::not_found("dish", dish_id));
    }
    if !found("product_found")? {
        return Err(StoreError::not_found("product", product_id));
    }
    Ok(())
}

/// Order lines return stock by the recipe they were deducted under, so a
/// recipe is frozen while any order line references its dish.
async fn ensure_recipe_unlocked(conn: &mut SqliteConnection, dish_id: DishId) -> StoreResult<()> {
    let in_use: i64 =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_items WHERE dish_id = ?)")
            .bind(dish_id.get())
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("check_open_order_lines", e))?;
    if in_use != 0 {
        warn!(dish_id = %dish_id, "recipe change refused: dish is on open orders");
        return Err(StoreError::Conflict(format!(
            "dish {dish_id} is on open orders; its recipe cannot change"
        )));
    }
    Ok(())
}

pub(crate) fn dish_from_row(row: &SqliteRow) -> Result<Dish, sqlx::Error> {
    Ok(Dish {
        id: DishId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
    })
}

fn ingredient_from_row(row: &SqliteRow) -> Result<DishIngredient, sqlx::Error> {
    Ok(DishIngredient {
        id: DishIngredientId::new(row.try_get("id")?),
        dish_id: DishId::new(row.try_get("dish_id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ProductStore, UnitStore, testing};
    use cafeteria_products::{ProductDraft, UnitDraft};

    struct Fixture {
        dishes: DishStore,
        ingredients: DishIngredientStore,
        flour: ProductId,
        milk: ProductId,
    }

    async fn fixture() -> Fixture {
        let pool = testing::pool().await;
        let unit = UnitStore::new(pool.clone())
            .create(UnitDraft {
                name: "грамм".into(),
                abbreviation: "г".into(),
            })
            .await
            .unwrap();
        let products = ProductStore::new(pool.clone());
        let mut ids = Vec::new();
        for name in ["Мука", "Молоко"] {
            let p = products
                .create(ProductDraft {
                    name: name.into(),
                    quantity: 1_000,
                    unit_id: unit.id,
                })
                .await
                .unwrap();
            ids.push(p.product.id);
        }
        Fixture {
            dishes: DishStore::new(pool.clone()),
            ingredients: DishIngredientStore::new(pool),
            flour: ids[0],
            milk: ids[1],
        }
    }

    fn pancakes() -> DishDraft {
        DishDraft {
            name: "Блинчики".into(),
            description: Some("с вареньем".into()),
            price: 25_000,
        }
    }

    #[tokio::test]
    async fn recipe_lists_in_product_order() {
        let f = fixture().await;
        let dish = f.dishes.create(pancakes()).await.unwrap();
        for (product_id, quantity) in [(f.milk, 200), (f.flour, 500)] {
            f.ingredients
                .create(DishIngredientDraft {
                    dish_id: dish.id,
                    product_id,
                    quantity,
                })
                .await
                .unwrap();
        }

        let recipe = f.dishes.ingredients(dish.id).await.unwrap();
        let lines: Vec<_> = recipe.iter().map(|i| (i.product_id, i.quantity)).collect();
        assert_eq!(lines, vec![(f.flour, 500), (f.milk, 200)]);
    }

    #[tokio::test]
    async fn duplicate_ingredient_is_a_conflict() {
        let f = fixture().await;
        let dish = f.dishes.create(pancakes()).await.unwrap();
        let line = DishIngredientDraft {
            dish_id: dish.id,
            product_id: f.flour,
            quantity: 500,
        };
        f.ingredients.create(line.clone()).await.unwrap();
        assert!(matches!(
            f.ingredients.create(line).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn ingredient_for_missing_dish_is_not_found() {
        let f = fixture().await;
        let err = f
            .ingredients
            .create(DishIngredientDraft {
                dish_id: DishId::new(77),
                product_id: f.flour,
                quantity: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "dish", id: 77 }));
    }

    #[tokio::test]
    async fn deleting_a_dish_drops_its_recipe() {
        let f = fixture().await;
        let dish = f.dishes.create(pancakes()).await.unwrap();
        f.ingredients
            .create(DishIngredientDraft {
                dish_id: dish.id,
                product_id: f.flour,
                quantity: 500,
            })
            .await
            .unwrap();

        f.dishes.delete(dish.id).await.unwrap();
        assert!(f.ingredients.list().await.unwrap().is_empty());
    }
}
