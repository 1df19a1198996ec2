use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        extractors::{AuthUser, BearerToken},
        services::TokenAuthenticator,
    },
    error::AppError,
    recipes::{
        dto::{PaginationRequest, PaginationResponse, RecipeInput},
        pagination,
        repo_types::Recipe,
        services,
    },
    state::AppState,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route("/recipes/search", post(search_recipes))
        .route("/recipes/random/:count", get(random_recipes))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

#[instrument(skip(state, user, input), fields(username = %user.username))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<RecipeInput>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    let recipe = services::create_recipe(&*state.recipes, input, &user).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state, _user))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    Ok(Json(services::get_recipe(&*state.recipes, &id).await?))
}

#[instrument(skip(state, token, input))]
pub async fn update_recipe(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<String>,
    Json(input): Json<RecipeInput>,
) -> Result<Json<Recipe>, AppError> {
    let auth = TokenAuthenticator::from_ref(&state);
    let recipe = services::update_recipe(&*state.recipes, &auth, &token, &id, input).await?;
    Ok(Json(recipe))
}

#[instrument(skip(state, token))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let auth = TokenAuthenticator::from_ref(&state);
    services::delete_recipe(&*state.recipes, &auth, &token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _user, req), fields(page_size = req.page_size, page_count = req.page_count))]
pub async fn search_recipes(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Json(req): Json<PaginationRequest>,
) -> Result<Json<PaginationResponse>, AppError> {
    Ok(Json(pagination::paginate(&*state.recipes, req).await?))
}

#[instrument(skip(state, _user))]
pub async fn random_recipes(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(count): Path<u64>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    Ok(Json(pagination::get_random_recipes(&*state.recipes, count).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::repo_types::RecipeFilter;
    use crate::users::repo_types::User;

    fn alice() -> User {
        User::new("alice".into(), "alice@example.com".into(), String::new())
    }

    fn named(name: &str) -> RecipeInput {
        RecipeInput {
            name: name.into(),
            ..RecipeInput::default()
        }
    }

    #[tokio::test]
    async fn create_then_search_and_sample() {
        let state = AppState::fake();
        for name in ["Miso soup", "Tomato soup", "Focaccia"] {
            let (status, _) = create_recipe(State(state.clone()), AuthUser(alice()), Json(named(name)))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::CREATED);
        }

        let Json(page) = search_recipes(
            State(state.clone()),
            AuthUser(alice()),
            Json(PaginationRequest {
                page_size: 10,
                page_count: 0,
                query_recipe: RecipeFilter {
                    name: Some("SOUP".into()),
                    tags: vec![],
                },
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.number_of_recipes, 2);
        assert_eq!(page.recipes.len(), 2);

        let Json(drawn) = random_recipes(State(state), AuthUser(alice()), Path(2))
            .await
            .unwrap();
        assert_eq!(drawn.len(), 2);
        assert_ne!(drawn[0].id, drawn[1].id);
    }

    #[tokio::test]
    async fn update_without_token_is_unauthorized() {
        let state = AppState::fake();
        let (_, Json(recipe)) = create_recipe(State(state.clone()), AuthUser(alice()), Json(named("Paella")))
            .await
            .unwrap();
        let err = update_recipe(
            State(state),
            BearerToken(String::new()),
            Path(recipe.id.to_hex()),
            Json(named("Seafood paella")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_name_is_bad_request() {
        let state = AppState::fake();
        let err = create_recipe(State(state), AuthUser(alice()), Json(named("")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
