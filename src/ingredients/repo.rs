use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::id::Id;
use crate::ingredients::repo_types::Ingredient;

#[async_trait]
pub trait IngredientReader: Send + Sync {
    async fn get_ingredient(&self, id: Id) -> anyhow::Result<Option<Ingredient>>;
    /// Case-insensitive name prefix match, id ascending.
    async fn query_ingredients(&self, prefix: &str, limit: u32) -> anyhow::Result<Vec<Ingredient>>;
}

#[async_trait]
pub trait IngredientWriter: Send + Sync {
    async fn insert_ingredient(&self, ingredient: Ingredient) -> anyhow::Result<Ingredient>;
    async fn delete_ingredient(&self, id: Id) -> anyhow::Result<bool>;
}

pub trait IngredientStore: IngredientReader + IngredientWriter {}

impl<T: IngredientReader + IngredientWriter + ?Sized> IngredientStore for T {}

#[derive(Debug, FromRow)]
struct IngredientRow {
    id: String,
    name: String,
    amount: f64,
    measurement: String,
    category: String,
}

impl TryFrom<IngredientRow> for Ingredient {
    type Error = anyhow::Error;

    fn try_from(r: IngredientRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id.parse().context("ingredient id")?,
            name: r.name,
            amount: r.amount,
            measurement: r.measurement,
            category: r.category,
        })
    }
}

#[derive(Clone)]
pub struct PgIngredientStore {
    db: PgPool,
}

impl PgIngredientStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IngredientReader for PgIngredientStore {
    async fn get_ingredient(&self, id: Id) -> anyhow::Result<Option<Ingredient>> {
        sqlx::query_as::<_, IngredientRow>(
            "SELECT id, name, amount, measurement, category FROM ingredients WHERE id = $1",
        )
        .bind(id.to_hex())
        .fetch_optional(&self.db)
        .await
        .context("select ingredient by id")?
        .map(Ingredient::try_from)
        .transpose()
    }

    async fn query_ingredients(&self, prefix: &str, limit: u32) -> anyhow::Result<Vec<Ingredient>> {
        sqlx::query_as::<_, IngredientRow>(
            r#"
            SELECT id, name, amount, measurement, category
              FROM ingredients
             WHERE left(lower(name), char_length($1)) = lower($1)
             ORDER BY id ASC
             LIMIT $2
            "#,
        )
        .bind(prefix)
        .bind(i64::from(limit))
        .fetch_all(&self.db)
        .await
        .context("query ingredients by prefix")?
        .into_iter()
        .map(Ingredient::try_from)
        .collect()
    }
}

#[async_trait]
impl IngredientWriter for PgIngredientStore {
    async fn insert_ingredient(&self, ingredient: Ingredient) -> anyhow::Result<Ingredient> {
        sqlx::query(
            r#"
            INSERT INTO ingredients (id, name, amount, measurement, category)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(ingredient.id.to_hex())
        .bind(&ingredient.name)
        .bind(ingredient.amount)
        .bind(&ingredient.measurement)
        .bind(&ingredient.category)
        .execute(&self.db)
        .await
        .context("insert ingredient")?;
        Ok(ingredient)
    }

    async fn delete_ingredient(&self, id: Id) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id.to_hex())
            .execute(&self.db)
            .await
            .context("delete ingredient")?;
        Ok(result.rows_affected() == 1)
    }
}
