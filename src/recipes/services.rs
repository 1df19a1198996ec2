use time::OffsetDateTime;
use tracing::info;

use crate::auth::services::TokenAuthenticator;
use crate::error::AppError;
use crate::id::Id;
use crate::recipes::dto::RecipeInput;
use crate::recipes::repo::{RecipeReader, RecipeStore, RecipeWriter};
use crate::recipes::repo_types::Recipe;
use crate::users::repo_types::User;

/// Path ids that do not parse cannot name a stored recipe.
pub fn parse_id(raw: &str, what: &'static str) -> Result<Id, AppError> {
    raw.parse().map_err(|_| AppError::NotFound(what))
}

fn validate(input: &RecipeInput) -> Result<(), AppError> {
    if input.name.trim().is_empty() {
        return Err(AppError::invalid(&["recipeName"]));
    }
    Ok(())
}

fn build(input: RecipeInput, id: Id, owner: String, created_at: OffsetDateTime) -> Recipe {
    Recipe {
        id,
        name: input.name.trim().to_owned(),
        created_at,
        updated_at: OffsetDateTime::now_utc(),
        owner,
        author: input.author,
        ingredients: input.ingredients,
        steps: input.steps,
        prep_time: input.prep_time,
        cook_time: input.cook_time,
        servings: input.servings,
        calories: input.calories,
        tags: input.tags,
        private: input.private,
    }
}

pub async fn create_recipe<R>(recipes: &R, input: RecipeInput, owner: &User) -> Result<Recipe, AppError>
where
    R: RecipeWriter + ?Sized,
{
    validate(&input)?;
    let recipe = build(input, Id::new(), owner.username.clone(), OffsetDateTime::now_utc());
    let recipe = recipes.insert_recipe(recipe).await?;
    info!(recipe_id = %recipe.id, owner = %recipe.owner, "recipe created");
    Ok(recipe)
}

pub async fn get_recipe<R: RecipeReader + ?Sized>(recipes: &R, id: &str) -> Result<Recipe, AppError> {
    let id = parse_id(id, "recipe")?;
    recipes
        .get_recipe(id)
        .await?
        .ok_or(AppError::NotFound("recipe"))
}

/// Full replace by id, owner only. Ids are only ever minted by
/// [`create_recipe`], so an unknown id is `NotFound`.
pub async fn update_recipe<R>(
    recipes: &R,
    auth: &TokenAuthenticator,
    token: &str,
    id: &str,
    input: RecipeInput,
) -> Result<Recipe, AppError>
where
    R: RecipeStore + ?Sized,
{
    let existing = get_recipe(recipes, id).await?;
    auth.validate_specific_user(token, &existing.owner).await?;
    validate(&input)?;

    let recipe = build(input, existing.id, existing.owner, existing.created_at);
    recipes.replace_recipe(&recipe).await?;
    info!(recipe_id = %recipe.id, "recipe replaced");
    Ok(recipe)
}

pub async fn delete_recipe<R>(
    recipes: &R,
    auth: &TokenAuthenticator,
    token: &str,
    id: &str,
) -> Result<(), AppError>
where
    R: RecipeStore + ?Sized,
{
    let existing = get_recipe(recipes, id).await?;
    auth.validate_specific_user(token, &existing.owner).await?;
    if !recipes.delete_recipe(existing.id).await? {
        return Err(AppError::NotFound("recipe"));
    }
    info!(recipe_id = %existing.id, "recipe deleted");
    Ok(())
}
