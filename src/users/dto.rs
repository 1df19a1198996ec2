use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::Id;
use crate::users::repo_types::{Role, User};

/// Request body for registration. Missing fields deserialize empty so the
/// validator can report every bad field at once.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub agreed_to_terms: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePasswordRequest {
    pub user_name: String,
    pub current_password: String,
    pub new_password: String,
}

/// User as shown to clients: no hash, no token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: Id,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    #[serde(rename = "householdID", skip_serializing_if = "Option::is_none")]
    pub household_id: Option<Id>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            user_name: u.username.clone(),
            email: u.email.clone(),
            role: u.role,
            household_id: u.household_id,
            created_at: u.created_at,
        }
    }
}

/// Shopping list grouped by aisle.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Basket {
    pub produce: Vec<String>,
    pub pantry: Vec<String>,
    pub protein: Vec<String>,
    pub dairy: Vec<String>,
    pub alcohol: Vec<String>,
}

impl Basket {
    /// Categories in the order they appear in the e-mail.
    pub fn categories(&self) -> [(&'static str, &[String]); 5] {
        [
            ("Produce", &self.produce),
            ("Pantry", &self.pantry),
            ("Protein", &self.protein),
            ("Dairy", &self.dairy),
            ("Alcohol", &self.alcohol),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_secrets() {
        let mut user = User::new("alice".into(), "alice@example.com".into(), "$argon2id$x".into());
        user.access_token = Some("tok".into());
        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert_eq!(json["userName"], "alice");
        assert_eq!(json["role"], "member");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("accessToken").is_none());
        assert!(json.get("householdID").is_none());
    }

    #[test]
    fn register_request_tolerates_missing_fields() {
        let req: RegisterRequest = serde_json::from_str(r#"{"userName": "bob"}"#).unwrap();
        assert_eq!(req.user_name, "bob");
        assert!(req.email.is_empty());
        assert!(!req.agreed_to_terms);
    }
}
