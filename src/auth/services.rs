use std::sync::Arc;

use axum::extract::FromRef;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::auth::password::verify_password;
use crate::error::{AppError, AuthError};
use crate::state::AppState;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

pub const TOKEN_LEN: usize = 32;

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Issues opaque bearer tokens and checks them against the user store.
/// One active token per user; logging in again replaces it.
#[derive(Clone)]
pub struct TokenAuthenticator {
    users: Arc<dyn UserStore>,
    ttl: Duration,
}

impl FromRef<AppState> for TokenAuthenticator {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.config.token_ttl())
    }
}

fn new_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl TokenAuthenticator {
    pub fn new(users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        Self { users, ttl }
    }

    async fn resolve(&self, token: &str) -> Result<User, AppError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        let user = self
            .users
            .find_by_token(token)
            .await?
            .ok_or(AuthError::UnknownToken)?;
        let expiry = user.token_expiry;
        match expiry {
            Some(expiry) if expiry > OffsetDateTime::now_utc() => Ok(user),
            _ => {
                warn!(username = %user.username, "expired token");
                Err(AuthError::ExpiredToken.into())
            }
        }
    }

    /// Resolves the session behind `token`. With `require_admin` the user must
    /// also hold the admin role.
    pub async fn validate_user(&self, token: &str, require_admin: bool) -> Result<User, AppError> {
        let user = self.resolve(token).await?;
        if require_admin && !user.is_admin() {
            warn!(username = %user.username, "admin route refused");
            return Err(AuthError::Forbidden("admin only".into()).into());
        }
        Ok(user)
    }

    /// Like [`validate_user`](Self::validate_user) but only `expected_username` passes.
    pub async fn validate_specific_user(
        &self,
        token: &str,
        expected_username: &str,
    ) -> Result<User, AppError> {
        let user = self.resolve(token).await?;
        if user.username != expected_username {
            warn!(username = %user.username, expected = %expected_username, "not the owner");
            return Err(AuthError::Forbidden(format!("only {expected_username} may do this")).into());
        }
        Ok(user)
    }

    /// Checks the credentials and stores a new token on the user, replacing
    /// any previous one. A failed attempt leaves the current token alone.
    pub async fn generate_token(&self, login: &str, password: &str) -> Result<IssuedToken, AppError> {
        let email = login.to_lowercase();
        let Some(mut user) = self.users.find_by_login(login, &email).await? else {
            warn!(%login, "login for unknown user");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !verify_password(password, &user.password_hash)? {
            warn!(username = %user.username, "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let issued = IssuedToken {
            token: new_token(),
            expires_at: OffsetDateTime::now_utc() + self.ttl,
        };
        user.access_token = Some(issued.token.clone());
        user.token_expiry = Some(issued.expires_at);
        self.users.replace_user(&user).await?;

        info!(username = %user.username, expires_at = %issued.expires_at, "token issued");
        debug!(user_id = %user.id, "token stored");
        Ok(issued)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::memory::MemoryStore;
    use crate::users::repo::{UserReader, UserWriter};
    use crate::users::repo_types::Role;

    pub(crate) async fn seed_user(
        store: &MemoryStore,
        username: &str,
        password: &str,
        role: Role,
    ) -> User {
        let mut user = User::new(
            username.into(),
            format!("{username}@example.com"),
            hash_password(password).unwrap(),
        );
        user.role = role;
        store.insert_user(user).await.unwrap()
    }

    fn authenticator() -> (Arc<MemoryStore>, TokenAuthenticator) {
        let store = Arc::new(MemoryStore::new());
        let auth = TokenAuthenticator::new(store.clone(), Duration::hours(24));
        (store, auth)
    }

    #[tokio::test]
    async fn empty_token_is_missing() {
        let (_, auth) = authenticator();
        let err = auth.validate_user("", false).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let (_, auth) = authenticator();
        let err = auth.validate_user("nope", false).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::UnknownToken)));
    }

    #[tokio::test]
    async fn issued_token_is_long_alphanumeric_and_valid() {
        let (store, auth) = authenticator();
        seed_user(&store, "alice", "correct-horse", Role::Member).await;

        let issued = auth.generate_token("alice", "correct-horse").await.unwrap();
        assert_eq!(issued.token.len(), TOKEN_LEN);
        assert!(issued.token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(issued.expires_at > OffsetDateTime::now_utc() + Duration::hours(23));

        let user = auth.validate_user(&issued.token, false).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn login_accepts_email() {
        let (store, auth) = authenticator();
        seed_user(&store, "alice", "correct-horse", Role::Member).await;
        assert!(auth.generate_token("alice@example.com", "correct-horse").await.is_ok());
        assert!(auth.generate_token("Alice@Example.COM", "correct-horse").await.is_ok());
        // usernames stay case-sensitive
        assert!(auth.generate_token("ALICE", "correct-horse").await.is_err());
    }

    #[tokio::test]
    async fn expired_token_fails_for_either_role_flag() {
        let (store, auth) = authenticator();
        for (name, role) in [("root", Role::Admin), ("bob", Role::Member)] {
            let mut user = seed_user(&store, name, "password1", role).await;
            user.access_token = Some(format!("{name}-token"));
            user.token_expiry = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
            store.replace_user(&user).await.unwrap();

            for require_admin in [false, true] {
                let err = auth
                    .validate_user(&format!("{name}-token"), require_admin)
                    .await
                    .unwrap_err();
                assert!(matches!(err, AppError::Auth(AuthError::ExpiredToken)));
            }
        }
    }

    #[tokio::test]
    async fn token_without_expiry_is_expired() {
        let (store, auth) = authenticator();
        let mut user = seed_user(&store, "carol", "password1", Role::Member).await;
        user.access_token = Some("dangling".into());
        store.replace_user(&user).await.unwrap();
        let err = auth.validate_user("dangling", false).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::ExpiredToken)));
    }

    #[tokio::test]
    async fn admin_gate() {
        let (store, auth) = authenticator();
        seed_user(&store, "bob", "password1", Role::Member).await;
        seed_user(&store, "root", "password1", Role::Admin).await;
        let member = auth.generate_token("bob", "password1").await.unwrap().token;
        let admin = auth.generate_token("root", "password1").await.unwrap().token;

        assert!(auth.validate_user(&member, false).await.is_ok());
        let err = auth.validate_user(&member, true).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::Forbidden(_))));
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert!(auth.validate_user(&admin, true).await.is_ok());
    }

    #[tokio::test]
    async fn ownership_gate_is_exact() {
        let (store, auth) = authenticator();
        seed_user(&store, "alice", "password1", Role::Member).await;
        seed_user(&store, "root", "password1", Role::Admin).await;
        let alice = auth.generate_token("alice", "password1").await.unwrap().token;
        let root = auth.generate_token("root", "password1").await.unwrap().token;

        assert!(auth.validate_specific_user(&alice, "alice").await.is_ok());
        for expected in ["Alice", "alice ", "bob"] {
            let err = auth.validate_specific_user(&alice, expected).await.unwrap_err();
            assert!(matches!(err, AppError::Auth(AuthError::Forbidden(_))));
        }
        // admins get no bypass
        assert!(auth.validate_specific_user(&root, "alice").await.is_err());
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_token() {
        let (store, auth) = authenticator();
        seed_user(&store, "alice", "password1", Role::Member).await;
        let first = auth.generate_token("alice", "password1").await.unwrap().token;
        let second = auth.generate_token("alice", "password1").await.unwrap().token;

        assert_ne!(first, second);
        let err = auth.validate_user(&first, false).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::UnknownToken)));
        assert!(auth.validate_user(&second, false).await.is_ok());
    }

    #[tokio::test]
    async fn bad_credentials_keep_existing_session() {
        let (store, auth) = authenticator();
        seed_user(&store, "alice", "password1", Role::Member).await;
        let token = auth.generate_token("alice", "password1").await.unwrap().token;

        let err = auth.generate_token("alice", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
        let err = auth.generate_token("mallory", "password1").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));

        let user = store.find_by_token(&token).await.unwrap();
        assert!(user.is_some());
    }
}
