use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    /// Anything other than `"admin"` is an ordinary member.
    pub fn from_db(raw: &str) -> Self {
        if raw == "admin" {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

/// User record in the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub password_hash: String,              // Argon2 PHC string
    pub access_token: Option<String>,       // current bearer token, if any
    pub token_expiry: Option<OffsetDateTime>,
    pub role: Role,
    pub household_id: Option<Id>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Id::new(),
            username,
            email,
            password_hash,
            access_token: None,
            token_expiry: None,
            role: Role::Member,
            household_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
