use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::password::{hash_password, is_strong_enough, verify_password};
use crate::error::{AppError, AuthError};
use crate::mailer::{Mailer, PLAIN_TEXT_UTF8};
use crate::users::dto::{Basket, RegisterRequest, UpdatePasswordRequest};
use crate::users::repo::{DuplicateUser, UserReader, UserStore, UserWriter};
use crate::users::repo_types::User;

pub const BASKET_SUBJECT: &str = "Grocery List";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Creates a member account. Every invalid field is reported together.
pub async fn register<R>(users: &R, mut req: RegisterRequest) -> Result<User, AppError>
where
    R: UserStore + ?Sized,
{
    req.user_name = req.user_name.trim().to_owned();
    req.email = req.email.trim().to_lowercase();

    let mut invalid = Vec::new();
    if req.user_name.is_empty() {
        invalid.push("userName");
    }
    if !is_valid_email(&req.email) {
        invalid.push("email");
    }
    if !is_strong_enough(&req.password) {
        invalid.push("password");
    }
    if !req.agreed_to_terms {
        invalid.push("agreedToTerms");
    }
    if !invalid.is_empty() {
        warn!(fields = ?invalid, "registration rejected");
        return Err(AppError::invalid(&invalid));
    }

    if let Some(existing) = users.find_by_login(&req.user_name, &req.email).await? {
        let what = if existing.username == req.user_name {
            "username"
        } else {
            "email"
        };
        warn!(username = %req.user_name, what, "registration duplicate");
        return Err(AppError::Duplicate(what));
    }

    let hash = hash_password(&req.password)?;
    // A concurrent registration can still win between the lookup and the insert.
    let user = users
        .insert_user(User::new(req.user_name, req.email, hash))
        .await
        .map_err(|e| match e.downcast_ref::<DuplicateUser>() {
            Some(DuplicateUser(what)) => AppError::Duplicate(what),
            None => AppError::Store(e),
        })?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Swaps the password and ends the current session.
pub async fn update_password<R>(users: &R, req: UpdatePasswordRequest) -> Result<(), AppError>
where
    R: UserStore + ?Sized,
{
    let Some(mut user) = users.find_by_login(&req.user_name, "").await? else {
        return Err(AuthError::InvalidCredentials.into());
    };
    if !verify_password(&req.current_password, &user.password_hash)? {
        warn!(username = %user.username, "password change with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }
    if !is_strong_enough(&req.new_password) {
        return Err(AppError::invalid(&["newPassword"]));
    }

    user.password_hash = hash_password(&req.new_password)?;
    user.access_token = None;
    user.token_expiry = None;
    users.replace_user(&user).await?;
    info!(username = %user.username, "password changed, session cleared");
    Ok(())
}

pub async fn list_users<R: UserReader + ?Sized>(users: &R) -> Result<Vec<User>, AppError> {
    Ok(users.list_users().await?)
}

pub async fn delete_user<R: UserWriter + ?Sized>(users: &R, username: &str) -> Result<(), AppError> {
    if !users.delete_user(username).await? {
        return Err(AppError::NotFound("user"));
    }
    info!(%username, "user deleted");
    Ok(())
}

/// Plain-text body: each non-empty category name, its items one per line,
/// then a blank line.
pub fn shopping_list(basket: &Basket) -> String {
    let mut out = String::new();
    for (category, items) in basket.categories() {
        if items.is_empty() {
            continue;
        }
        out.push_str(category);
        out.push('\n');
        for item in items {
            out.push_str(item);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

pub async fn email_basket<M>(mailer: &M, user: &User, basket: &Basket) -> Result<(), AppError>
where
    M: Mailer + ?Sized,
{
    let body = shopping_list(basket);
    mailer
        .send(BASKET_SUBJECT, PLAIN_TEXT_UTF8, &body, &[user.email.clone()])
        .await?;
    info!(username = %user.username, "basket sent");
    Ok(())
}
