use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppError,
    ingredients::{
        dto::{IngredientInput, IngredientQuery},
        repo_types::Ingredient,
        services,
    },
    state::AppState,
};

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", post(create_ingredient).get(query_ingredients))
        .route("/ingredients/:id", get(get_ingredient).delete(delete_ingredient))
}

#[instrument(skip(state, _user, input))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(input): Json<IngredientInput>,
) -> Result<(StatusCode, Json<Ingredient>), AppError> {
    let ingredient = services::create_ingredient(&*state.ingredients, input).await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[instrument(skip(state, _user))]
pub async fn query_ingredients(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(q): Query<IngredientQuery>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    Ok(Json(services::query_ingredients(&*state.ingredients, &q.prefix).await?))
}

#[instrument(skip(state, _user))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ingredient>, AppError> {
    Ok(Json(services::get_ingredient(&*state.ingredients, &id).await?))
}

#[instrument(skip(state, _admin))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    services::delete_ingredient(&*state.ingredients, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::User;

    #[tokio::test]
    async fn create_and_autocomplete() {
        let state = AppState::fake();
        let user = || User::new("alice".into(), "alice@example.com".into(), String::new());
        let (_, Json(created)) = create_ingredient(
            State(state.clone()),
            AuthUser(user()),
            Json(IngredientInput {
                name: "Paprika".into(),
                ..IngredientInput::default()
            }),
        )
        .await
        .unwrap();

        let Json(found) = query_ingredients(
            State(state),
            AuthUser(user()),
            Query(IngredientQuery { prefix: "pap".into() }),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], created);
    }
}
