use tracing::info;

use crate::error::AppError;
use crate::id::Id;
use crate::ingredients::dto::IngredientInput;
use crate::ingredients::repo::{IngredientReader, IngredientWriter};
use crate::ingredients::repo_types::Ingredient;
use crate::recipes::services::parse_id;

/// Autocomplete returns at most this many matches.
pub const PREFIX_LIMIT: u32 = 5;

pub async fn create_ingredient<R>(store: &R, input: IngredientInput) -> Result<Ingredient, AppError>
where
    R: IngredientWriter + ?Sized,
{
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::invalid(&["name"]));
    }
    let ingredient = store
        .insert_ingredient(Ingredient {
            id: Id::new(),
            name: name.to_owned(),
            amount: input.amount,
            measurement: input.measurement,
            category: input.category,
        })
        .await?;
    info!(ingredient_id = %ingredient.id, name = %ingredient.name, "ingredient created");
    Ok(ingredient)
}

pub async fn get_ingredient<R>(store: &R, id: &str) -> Result<Ingredient, AppError>
where
    R: IngredientReader + ?Sized,
{
    let id = parse_id(id, "ingredient")?;
    store
        .get_ingredient(id)
        .await?
        .ok_or(AppError::NotFound("ingredient"))
}

pub async fn query_ingredients<R>(store: &R, prefix: &str) -> Result<Vec<Ingredient>, AppError>
where
    R: IngredientReader + ?Sized,
{
    Ok(store.query_ingredients(prefix.trim(), PREFIX_LIMIT).await?)
}

pub async fn delete_ingredient<R>(store: &R, id: &str) -> Result<(), AppError>
where
    R: IngredientWriter + ?Sized,
{
    let id = parse_id(id, "ingredient")?;
    if !store.delete_ingredient(id).await? {
        return Err(AppError::NotFound("ingredient"));
    }
    info!(ingredient_id = %id, "ingredient deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn named(name: &str) -> IngredientInput {
        IngredientInput {
            name: name.into(),
            amount: 1.0,
            measurement: "cup".into(),
            category: "Produce".into(),
        }
    }

    #[tokio::test]
    async fn prefix_query_is_case_insensitive_and_capped() {
        let store = MemoryStore::new();
        for name in ["Carrot", "carob", "Cardamom", "Caraway", "Cargo", "Car seat", "Basil"] {
            create_ingredient(&store, named(name)).await.unwrap();
        }
        let found = query_ingredients(&store, "CAR").await.unwrap();
        assert_eq!(found.len(), PREFIX_LIMIT as usize);
        assert!(found.iter().all(|i| i.name.to_lowercase().starts_with("car")));

        let found = query_ingredients(&store, "bas").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Basil");
    }

    #[tokio::test]
    async fn empty_name_is_invalid() {
        let store = MemoryStore::new();
        match create_ingredient(&store, named("  ")).await.unwrap_err() {
            AppError::ValidationFailed { invalid_fields } => assert_eq!(invalid_fields, vec!["name"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_and_delete_by_id() {
        let store = MemoryStore::new();
        let salt = create_ingredient(&store, named("Salt")).await.unwrap();
        let id = salt.id.to_hex();
        assert_eq!(get_ingredient(&store, &id).await.unwrap(), salt);
        delete_ingredient(&store, &id).await.unwrap();
        assert!(matches!(
            get_ingredient(&store, &id).await.unwrap_err(),
            AppError::NotFound("ingredient")
        ));
        assert!(delete_ingredient(&store, &id).await.is_err());
    }
}
