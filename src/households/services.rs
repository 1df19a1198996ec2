use time::Date;
use tracing::{info, warn};

use crate::auth::services::TokenAuthenticator;
use crate::error::{AppError, AuthError};
use crate::households::dto::CalendarInput;
use crate::households::repo::{CalendarReader, CalendarStore, CalendarWriter, HouseholdReader, HouseholdWriter};
use crate::households::repo_types::{Calendar, Household, WeekPlan};
use crate::id::Id;
use crate::recipes::pagination::get_random_recipes;
use crate::recipes::repo::RecipeReader;
use crate::recipes::services::parse_id;
use crate::users::repo::{UserReader, UserStore};
use crate::users::repo_types::User;

/// Stores a household headed by `creator`. Membership is a separate step.
pub async fn create_household<H>(households: &H, name: &str, creator: &User) -> Result<Household, AppError>
where
    H: HouseholdWriter + ?Sized,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid(&["householdName"]));
    }
    let household = households
        .insert_household(Household {
            id: Id::new(),
            name: name.to_owned(),
            head_of_household: creator.id,
        })
        .await?;
    info!(household_id = %household.id, head = %creator.username, "household created");
    Ok(household)
}

pub async fn add_user_to_household<U>(users: &U, household_id: Id, username: &str) -> Result<User, AppError>
where
    U: UserStore + ?Sized,
{
    let mut user = users
        .find_by_login(username, "")
        .await?
        .ok_or(AppError::NotFound("user"))?;
    user.household_id = Some(household_id);
    users.replace_user(&user).await?;
    info!(%household_id, username = %user.username, "user joined household");
    Ok(user)
}

pub async fn get_household<H>(households: &H, id: &str) -> Result<Household, AppError>
where
    H: HouseholdReader + ?Sized,
{
    let id = parse_id(id, "household")?;
    households
        .get_household(id)
        .await?
        .ok_or(AppError::NotFound("household"))
}

/// Passes only when `token` belongs to the head of `household`.
pub async fn authorize_head<U>(
    auth: &TokenAuthenticator,
    users: &U,
    token: &str,
    household: &Household,
) -> Result<User, AppError>
where
    U: UserReader + ?Sized,
{
    let Some(head) = users.find_by_id(household.head_of_household).await? else {
        warn!(household_id = %household.id, "head of household no longer exists");
        return Err(AuthError::Forbidden("household has no head".into()).into());
    };
    auth.validate_specific_user(token, &head.username).await
}

pub async fn delete_household<H, U>(
    households: &H,
    users: &U,
    auth: &TokenAuthenticator,
    token: &str,
    id: &str,
) -> Result<(), AppError>
where
    H: HouseholdReader + HouseholdWriter + ?Sized,
    U: UserReader + ?Sized,
{
    let household = get_household(households, id).await?;
    authorize_head(auth, users, token, &household).await?;
    if !households.delete_household(household.id).await? {
        return Err(AppError::NotFound("household"));
    }
    info!(household_id = %household.id, "household deleted");
    Ok(())
}

/// Fills Sunday..Saturday from one random draw of seven recipes. Nothing is
/// stored unless all seven slots can be filled.
pub async fn create_calendar<R, C>(
    recipes: &R,
    calendars: &C,
    start_date: Date,
    household_id: Id,
) -> Result<Calendar, AppError>
where
    R: RecipeReader + ?Sized,
    C: CalendarWriter + ?Sized,
{
    let drawn = get_random_recipes(recipes, WeekPlan::DAYS as u64).await?;
    let days = WeekPlan::from_draw(drawn).map_err(|partial| {
        warn!(available = partial.len(), "not enough recipes for a week");
        AppError::CalendarGenerationFailed {
            available: partial.len() as u64,
        }
    })?;
    let calendar = calendars
        .insert_calendar(Calendar {
            id: Id::new(),
            household_id,
            start_date,
            days,
        })
        .await?;
    info!(calendar_id = %calendar.id, %household_id, %start_date, "calendar created");
    Ok(calendar)
}

/// Replaces (or inserts) a calendar for `household_id`. A calendar bound to
/// another household cannot be taken over.
pub async fn update_calendar<C>(
    calendars: &C,
    household_id: Id,
    input: CalendarInput,
) -> Result<Calendar, AppError>
where
    C: CalendarStore + ?Sized,
{
    let id = input.id.unwrap_or_else(Id::new);
    if let Some(existing) = calendars.calendar_by_id(id).await? {
        if existing.household_id != household_id {
            warn!(calendar_id = %id, "calendar belongs to another household");
            return Err(AuthError::Forbidden("calendar belongs to another household".into()).into());
        }
    }
    let calendar = Calendar {
        id,
        household_id,
        start_date: input.start_date,
        days: input.days,
    };
    calendars.replace_calendar(&calendar).await?;
    info!(calendar_id = %calendar.id, %household_id, "calendar replaced");
    Ok(calendar)
}

pub async fn get_calendar<C>(calendars: &C, household_id: Id, start_date: Date) -> Result<Calendar, AppError>
where
    C: CalendarReader + ?Sized,
{
    calendars
        .get_calendar(household_id, start_date)
        .await?
        .ok_or(AppError::NotFound("calendar"))
}
