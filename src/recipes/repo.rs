use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;

use crate::id::Id;
use crate::recipes::repo_types::{Recipe, RecipeFilter, RecipeIngredient, Step};

#[async_trait]
pub trait RecipeReader: Send + Sync {
    async fn get_recipe(&self, id: Id) -> anyhow::Result<Option<Recipe>>;

    /// Up to `limit` recipes matching `filter` whose id is strictly greater
    /// than `cursor`, id ascending.
    async fn page_after(
        &self,
        cursor: Id,
        filter: &RecipeFilter,
        limit: u32,
    ) -> anyhow::Result<Vec<Recipe>>;

    async fn count_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait RecipeWriter: Send + Sync {
    async fn insert_recipe(&self, recipe: Recipe) -> anyhow::Result<Recipe>;
    /// Full-document replace keyed by id; inserts when absent.
    async fn replace_recipe(&self, recipe: &Recipe) -> anyhow::Result<()>;
    /// Returns whether a recipe was deleted.
    async fn delete_recipe(&self, id: Id) -> anyhow::Result<bool>;
}

pub trait RecipeStore: RecipeReader + RecipeWriter {}

impl<T: RecipeReader + RecipeWriter + ?Sized> RecipeStore for T {}

#[derive(Debug, FromRow)]
struct RecipeRow {
    id: String,
    name: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    owner: String,
    author: Option<String>,
    ingredients: Json<Vec<RecipeIngredient>>,
    steps: Json<Vec<Step>>,
    prep_time: i32,
    cook_time: i32,
    servings: i32,
    calories: i32,
    tags: Vec<String>,
    private: bool,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = anyhow::Error;

    fn try_from(r: RecipeRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id.parse().context("recipe id")?,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
            owner: r.owner,
            author: r.author,
            ingredients: r.ingredients.0,
            steps: r.steps.0,
            prep_time: r.prep_time,
            cook_time: r.cook_time,
            servings: r.servings,
            calories: r.calories,
            tags: r.tags,
            private: r.private,
        })
    }
}

const RECIPE_COLUMNS: &str = "id, name, created_at, updated_at, owner, author, ingredients, steps, \
     prep_time, cook_time, servings, calories, tags, private";

// An empty fragment matches every name and an empty tag array is contained in
// every array, so one statement serves filtered and unfiltered queries.
const RECIPE_FILTER: &str = "strpos(lower(name), lower($1)) > 0 AND tags @> $2::text[]";

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecipeReader for PgRecipeStore {
    async fn get_recipe(&self, id: Id) -> anyhow::Result<Option<Recipe>> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1");
        sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.db)
            .await
            .context("select recipe by id")?
            .map(Recipe::try_from)
            .transpose()
    }

    async fn page_after(
        &self,
        cursor: Id,
        filter: &RecipeFilter,
        limit: u32,
    ) -> anyhow::Result<Vec<Recipe>> {
        let sql = format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes \
             WHERE {RECIPE_FILTER} AND id > $3 \
             ORDER BY id ASC LIMIT $4"
        );
        sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(filter.name_fragment())
            .bind(&filter.tags)
            .bind(cursor.to_hex())
            .bind(i64::from(limit))
            .fetch_all(&self.db)
            .await
            .context("select recipe page")?
            .into_iter()
            .map(Recipe::try_from)
            .collect()
    }

    async fn count_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM recipes WHERE {RECIPE_FILTER}");
        let n: i64 = sqlx::query_scalar(&sql)
            .bind(filter.name_fragment())
            .bind(&filter.tags)
            .fetch_one(&self.db)
            .await
            .context("count recipes")?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl RecipeWriter for PgRecipeStore {
    async fn insert_recipe(&self, recipe: Recipe) -> anyhow::Result<Recipe> {
        let sql = format!(
            "INSERT INTO recipes ({RECIPE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        );
        bind_recipe(sqlx::query(&sql), &recipe)
            .execute(&self.db)
            .await
            .context("insert recipe")?;
        Ok(recipe)
    }

    async fn replace_recipe(&self, recipe: &Recipe) -> anyhow::Result<()> {
        let sql = format!(
            "INSERT INTO recipes ({RECIPE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, created_at = EXCLUDED.created_at, \
                updated_at = EXCLUDED.updated_at, owner = EXCLUDED.owner, \
                author = EXCLUDED.author, ingredients = EXCLUDED.ingredients, \
                steps = EXCLUDED.steps, prep_time = EXCLUDED.prep_time, \
                cook_time = EXCLUDED.cook_time, servings = EXCLUDED.servings, \
                calories = EXCLUDED.calories, tags = EXCLUDED.tags, \
                private = EXCLUDED.private"
        );
        bind_recipe(sqlx::query(&sql), recipe)
            .execute(&self.db)
            .await
            .context("replace recipe")?;
        Ok(())
    }

    async fn delete_recipe(&self, id: Id) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id.to_hex())
            .execute(&self.db)
            .await
            .context("delete recipe")?;
        Ok(result.rows_affected() == 1)
    }
}

fn bind_recipe<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    recipe: &'q Recipe,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(recipe.id.to_hex())
        .bind(&recipe.name)
        .bind(recipe.created_at)
        .bind(recipe.updated_at)
        .bind(&recipe.owner)
        .bind(&recipe.author)
        .bind(Json(&recipe.ingredients))
        .bind(Json(&recipe.steps))
        .bind(recipe.prep_time)
        .bind(recipe.cook_time)
        .bind(recipe.servings)
        .bind(recipe.calories)
        .bind(&recipe.tags)
        .bind(recipe.private)
}
