use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{TokenRequest, TokenResponse},
        services::TokenAuthenticator,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/token", post(issue_token))
}

#[instrument(skip(state, payload), fields(login = %payload.user_name))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let auth = TokenAuthenticator::from_ref(&state);
    let issued = auth
        .generate_token(payload.user_name.trim(), &payload.password)
        .await?;
    Ok(Json(TokenResponse {
        access_token: issued.token,
        expires_at: issued.expires_at,
    }))
}
