use std::collections::BTreeMap;

use async_trait::async_trait;
use time::Date;
use tokio::sync::RwLock;

use crate::households::repo::{CalendarReader, CalendarWriter, HouseholdReader, HouseholdWriter};
use crate::households::repo_types::{Calendar, Household};
use crate::id::Id;
use crate::ingredients::repo::{IngredientReader, IngredientWriter};
use crate::ingredients::repo_types::Ingredient;
use crate::recipes::repo::{RecipeReader, RecipeWriter};
use crate::recipes::repo_types::{Recipe, RecipeFilter};
use crate::state::StoreHealth;
use crate::users::repo::{DuplicateUser, UserReader, UserWriter};
use crate::users::repo_types::User;

/// Process-local store keeping every collection in an id-ordered map.
/// Used by tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<Id, User>>,
    recipes: RwLock<BTreeMap<Id, Recipe>>,
    ingredients: RwLock<BTreeMap<Id, Ingredient>>,
    households: RwLock<BTreeMap<Id, Household>>,
    calendars: RwLock<BTreeMap<Id, Calendar>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserReader for MemoryStore {
    async fn find_by_login(&self, username: &str, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        let by_name = users.values().find(|u| u.username == username);
        let by_email = || {
            users
                .values()
                .find(|u| !email.is_empty() && u.email == email)
        };
        Ok(by_name.or_else(by_email).cloned())
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.access_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_id(&self, id: Id) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl UserWriter for MemoryStore {
    async fn insert_user(&self, user: User) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(DuplicateUser("username").into());
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(DuplicateUser("email").into());
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn replace_user(&self, user: &User) -> anyhow::Result<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> anyhow::Result<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|_, u| u.username != username);
        Ok(users.len() < before)
    }
}

#[async_trait]
impl RecipeReader for MemoryStore {
    async fn get_recipe(&self, id: Id) -> anyhow::Result<Option<Recipe>> {
        Ok(self.recipes.read().await.get(&id).cloned())
    }

    async fn page_after(
        &self,
        cursor: Id,
        filter: &RecipeFilter,
        limit: u32,
    ) -> anyhow::Result<Vec<Recipe>> {
        use std::ops::Bound::{Excluded, Unbounded};

        let recipes = self.recipes.read().await;
        Ok(recipes
            .range((Excluded(cursor), Unbounded))
            .map(|(_, r)| r)
            .filter(|r| filter.matches(r))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_recipes(&self, filter: &RecipeFilter) -> anyhow::Result<u64> {
        let recipes = self.recipes.read().await;
        Ok(recipes.values().filter(|r| filter.matches(r)).count() as u64)
    }
}

#[async_trait]
impl RecipeWriter for MemoryStore {
    async fn insert_recipe(&self, recipe: Recipe) -> anyhow::Result<Recipe> {
        let mut recipes = self.recipes.write().await;
        anyhow::ensure!(!recipes.contains_key(&recipe.id), "duplicate recipe id {}", recipe.id);
        recipes.insert(recipe.id, recipe.clone());
        Ok(recipe)
    }

    async fn replace_recipe(&self, recipe: &Recipe) -> anyhow::Result<()> {
        self.recipes.write().await.insert(recipe.id, recipe.clone());
        Ok(())
    }

    async fn delete_recipe(&self, id: Id) -> anyhow::Result<bool> {
        Ok(self.recipes.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl IngredientReader for MemoryStore {
    async fn get_ingredient(&self, id: Id) -> anyhow::Result<Option<Ingredient>> {
        Ok(self.ingredients.read().await.get(&id).cloned())
    }

    async fn query_ingredients(&self, prefix: &str, limit: u32) -> anyhow::Result<Vec<Ingredient>> {
        let prefix = prefix.to_lowercase();
        let ingredients = self.ingredients.read().await;
        Ok(ingredients
            .values()
            .filter(|i| i.name.to_lowercase().starts_with(&prefix))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IngredientWriter for MemoryStore {
    async fn insert_ingredient(&self, ingredient: Ingredient) -> anyhow::Result<Ingredient> {
        self.ingredients
            .write()
            .await
            .insert(ingredient.id, ingredient.clone());
        Ok(ingredient)
    }

    async fn delete_ingredient(&self, id: Id) -> anyhow::Result<bool> {
        Ok(self.ingredients.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl HouseholdReader for MemoryStore {
    async fn get_household(&self, id: Id) -> anyhow::Result<Option<Household>> {
        Ok(self.households.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl HouseholdWriter for MemoryStore {
    async fn insert_household(&self, household: Household) -> anyhow::Result<Household> {
        self.households
            .write()
            .await
            .insert(household.id, household.clone());
        Ok(household)
    }

    async fn delete_household(&self, id: Id) -> anyhow::Result<bool> {
        Ok(self.households.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl CalendarReader for MemoryStore {
    async fn calendar_by_id(&self, id: Id) -> anyhow::Result<Option<Calendar>> {
        Ok(self.calendars.read().await.get(&id).cloned())
    }

    async fn get_calendar(&self, household_id: Id, start_date: Date) -> anyhow::Result<Option<Calendar>> {
        let calendars = self.calendars.read().await;
        Ok(calendars
            .values()
            .rev()
            .find(|c| c.household_id == household_id && c.start_date == start_date)
            .cloned())
    }
}

#[async_trait]
impl CalendarWriter for MemoryStore {
    async fn insert_calendar(&self, calendar: Calendar) -> anyhow::Result<Calendar> {
        self.calendars
            .write()
            .await
            .insert(calendar.id, calendar.clone());
        Ok(calendar)
    }

    async fn replace_calendar(&self, calendar: &Calendar) -> anyhow::Result<()> {
        self.calendars
            .write()
            .await
            .insert(calendar.id, calendar.clone());
        Ok(())
    }
}
