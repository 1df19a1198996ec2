use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppError,
    state::AppState,
    users::{
        dto::{Basket, PublicUser, RegisterRequest, UpdatePasswordRequest},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register).get(list_users))
        .route("/users/password", put(update_password))
        .route("/users/basket", post(email_basket))
        .route("/users/:username", delete(delete_user))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload), fields(username = %payload.user_name))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = services::register(&*state.users, payload).await?;
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

#[instrument(skip(state, payload), fields(username = %payload.user_name))]
pub async fn update_password(
    State(state): State<AppState>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, AppError> {
    services::update_password(&*state.users, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, admin), fields(admin = %admin.username))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = services::list_users(&*state.users).await?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    services::delete_user(&*state.users, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user, basket), fields(username = %user.username))]
pub async fn email_basket(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(basket): Json<Basket>,
) -> Result<StatusCode, AppError> {
    services::email_basket(&*state.mailer, &user, &basket).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(user), fields(username = %user.username))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::tests::seed_user;
    use crate::auth::services::TokenAuthenticator;
    use crate::error::AuthError;
    use crate::users::repo_types::{Role, User};
    use axum::extract::FromRef;

    fn register_body(name: &str) -> RegisterRequest {
        RegisterRequest {
            user_name: name.into(),
            email: format!("{name}@example.com"),
            password: "long-enough".into(),
            agreed_to_terms: true,
        }
    }

    #[tokio::test]
    async fn register_returns_created_public_user() {
        let state = AppState::fake();
        let (status, Json(user)) = register(State(state.clone()), Json(register_body("alice")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.user_name, "alice");
        assert!(state.users.find_by_login("alice", "").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn admin_can_list_and_delete() {
        let state = AppState::fake();
        let (_, Json(bob)) = register(State(state.clone()), Json(register_body("bob")))
            .await
            .unwrap();
        assert_eq!(bob.user_name, "bob");
        let root = User::new("root".into(), "root@example.com".into(), String::new());
        let root = User { role: Role::Admin, ..root };

        let Json(listed) = list_users(State(state.clone()), AdminUser(root.clone()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let status = delete_user(State(state.clone()), AdminUser(root.clone()), Path("bob".into()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        let err = delete_user(State(state), AdminUser(root), Path("bob".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn member_token_is_refused_on_admin_extractor() {
        use axum::extract::FromRequestParts;
        use axum::http::{header::AUTHORIZATION, Request};

        let state = AppState::fake();
        let (_, Json(bob)) = register(State(state.clone()), Json(register_body("bob")))
            .await
            .unwrap();
        assert_eq!(bob.user_name, "bob");
        let auth = TokenAuthenticator::from_ref(&state);
        let token = auth.generate_token("bob", "long-enough").await.unwrap().token;

        let (mut parts, _) = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        let err = AdminUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Auth(AuthError::Forbidden(_))));
        assert!(AuthUser::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn basket_lands_in_outbox() {
        let outbox = std::sync::Arc::new(crate::mailer::Outbox::default());
        let state = AppState::in_memory(Default::default(), outbox.clone());
        let store = crate::memory::MemoryStore::new();
        let user = seed_user(&store, "alice", "long-enough", Role::Member).await;

        let basket = Basket {
            produce: vec!["basil".into()],
            ..Basket::default()
        };
        let status = email_basket(State(state), AuthUser(user), Json(basket)).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outbox.sent().await[0].body, "Produce\nbasil\n\n");
    }
}
