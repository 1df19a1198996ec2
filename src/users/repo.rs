use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::id::Id;
use crate::users::repo_types::{Role, User};

#[async_trait]
pub trait UserReader: Send + Sync {
    /// Matches on username, or on email when `email` is non-empty.
    async fn find_by_login(&self, username: &str, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Id) -> anyhow::Result<Option<User>>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
}

#[async_trait]
pub trait UserWriter: Send + Sync {
    async fn insert_user(&self, user: User) -> anyhow::Result<User>;
    /// Full-document replace keyed by id; inserts when absent.
    async fn replace_user(&self, user: &User) -> anyhow::Result<()>;
    /// Returns whether a user was deleted.
    async fn delete_user(&self, username: &str) -> anyhow::Result<bool>;
}

pub trait UserStore: UserReader + UserWriter {}

/// Insert refused because another account holds the same username or email.
#[derive(Debug, thiserror::Error)]
#[error("duplicate {0}")]
pub struct DuplicateUser(pub &'static str);

fn duplicate_field(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    if !db.is_unique_violation() {
        return None;
    }
    match db.constraint() {
        Some("users_username_key") => Some("username"),
        Some("users_email_key") => Some("email"),
        _ => None,
    }
}

impl<T: UserReader + UserWriter + ?Sized> UserStore for T {}

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    access_token: Option<String>,
    token_expiry: Option<OffsetDateTime>,
    role: String,
    household_id: Option<String>,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> anyhow::Result<Self> {
        Ok(Self {
            id: r.id.parse().context("user id")?,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            access_token: r.access_token,
            token_expiry: r.token_expiry,
            role: Role::from_db(&r.role),
            household_id: r
                .household_id
                .map(|h| h.parse())
                .transpose()
                .context("user household id")?,
            created_at: r.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, access_token, token_expiry, role, household_id, created_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_one_where(&self, clause: &str, arg: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(arg)
            .fetch_optional(&self.db)
            .await
            .with_context(|| format!("select user where {clause}"))?
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl UserReader for PgUserStore {
    async fn find_by_login(&self, username: &str, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE username = $1 OR ($2 <> '' AND email = $2) \
             ORDER BY (username = $1) DESC LIMIT 1"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("select user by login")?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_token(&self, token: &str) -> anyhow::Result<Option<User>> {
        self.fetch_one_where("access_token = $1", token).await
    }

    async fn find_by_id(&self, id: Id) -> anyhow::Result<Option<User>> {
        self.fetch_one_where("id = $1", &id.to_hex()).await
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.db)
            .await
            .context("list users")?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

#[async_trait]
impl UserWriter for PgUserStore {
    async fn insert_user(&self, user: User) -> anyhow::Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, access_token,
                               token_expiry, role, household_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id.to_hex())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.access_token)
        .bind(user.token_expiry)
        .bind(user.role.as_str())
        .bind(user.household_id.map(|h| h.to_hex()))
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| match duplicate_field(&e) {
            Some(field) => anyhow::Error::new(DuplicateUser(field)),
            None => anyhow::Error::new(e).context("insert user"),
        })?;
        Ok(user)
    }

    async fn replace_user(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, access_token,
                               token_expiry, role, household_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                access_token = EXCLUDED.access_token,
                token_expiry = EXCLUDED.token_expiry,
                role = EXCLUDED.role,
                household_id = EXCLUDED.household_id
            "#,
        )
        .bind(user.id.to_hex())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.access_token)
        .bind(user.token_expiry)
        .bind(user.role.as_str())
        .bind(user.household_id.map(|h| h.to_hex()))
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .context("replace user")?;
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected() == 1)
    }
}
