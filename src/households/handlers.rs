use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        extractors::{AuthUser, BearerToken},
        services::TokenAuthenticator,
    },
    error::AppError,
    households::{
        dto::{AddMemberRequest, CalendarDate, CalendarInput, CreateHouseholdRequest},
        repo_types::{Calendar, Household},
        services,
    },
    state::AppState,
    users::{dto::PublicUser, repo_types::User},
};

pub fn household_routes() -> Router<AppState> {
    Router::new()
        .route("/households", post(create_household))
        .route("/households/:id", get(get_household).delete(delete_household))
        .route("/households/:id/members", put(add_member))
}

pub fn calendar_routes() -> Router<AppState> {
    Router::new().route(
        "/calendars",
        post(create_calendar).get(get_calendar).put(update_calendar),
    )
}

/// The caller's household, which must still exist.
async fn own_household(state: &AppState, user: &User) -> Result<Household, AppError> {
    let id = user.household_id.ok_or(AppError::NotFound("household"))?;
    state
        .households
        .get_household(id)
        .await?
        .ok_or(AppError::NotFound("household"))
}

#[instrument(skip(state, user, req), fields(username = %user.username))]
pub async fn create_household(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateHouseholdRequest>,
) -> Result<(StatusCode, Json<Household>), AppError> {
    let household = services::create_household(&*state.households, &req.name, &user).await?;
    services::add_user_to_household(&*state.users, household.id, &user.username).await?;
    Ok((StatusCode::CREATED, Json(household)))
}

#[instrument(skip(state, _user))]
pub async fn get_household(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Household>, AppError> {
    Ok(Json(services::get_household(&*state.households, &id).await?))
}

#[instrument(skip(state, token))]
pub async fn delete_household(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let auth = TokenAuthenticator::from_ref(&state);
    services::delete_household(&*state.households, &*state.users, &auth, &token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, token, req), fields(member = %req.user_name))]
pub async fn add_member(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let auth = TokenAuthenticator::from_ref(&state);
    let household = services::get_household(&*state.households, &id).await?;
    services::authorize_head(&auth, &*state.users, &token, &household).await?;
    let member = services::add_user_to_household(&*state.users, household.id, &req.user_name).await?;
    Ok(Json(PublicUser::from(&member)))
}

#[instrument(skip(state, user, req), fields(username = %user.username))]
pub async fn create_calendar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CalendarDate>,
) -> Result<(StatusCode, Json<Calendar>), AppError> {
    let household = own_household(&state, &user).await?;
    let calendar =
        services::create_calendar(&*state.recipes, &*state.calendars, req.start_date, household.id)
            .await?;
    Ok((StatusCode::CREATED, Json(calendar)))
}

#[instrument(skip(state, user, q), fields(username = %user.username, start_date = %q.start_date))]
pub async fn get_calendar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(q): Query<CalendarDate>,
) -> Result<Json<Calendar>, AppError> {
    let household = own_household(&state, &user).await?;
    Ok(Json(
        services::get_calendar(&*state.calendars, household.id, q.start_date).await?,
    ))
}

#[instrument(skip(state, user, input), fields(username = %user.username))]
pub async fn update_calendar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CalendarInput>,
) -> Result<Json<Calendar>, AppError> {
    let household = own_household(&state, &user).await?;
    Ok(Json(
        services::update_calendar(&*state.calendars, household.id, input).await?,
    ))
}
