use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Why a bearer token or a login was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token in request")]
    MissingToken,

    #[error("no user with that access token")]
    UnknownToken,

    #[error("expired token")]
    ExpiredToken,

    #[error("failed authentication, unknown user or password")]
    InvalidCredentials,

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthError {
    /// 403 for an authenticated caller lacking privilege, 401 for everything else.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid fields: {}", invalid_fields.join(", "))]
    ValidationFailed { invalid_fields: Vec<String> },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} already taken")]
    Duplicate(&'static str),

    #[error("not enough recipes to fill a week: {available} available")]
    CalendarGenerationFailed { available: u64 },

    #[error("recipe #{index} disappeared while sampling")]
    SampleOutOfRange { index: u64 },

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(fields: &[&str]) -> Self {
        AppError::ValidationFailed {
            invalid_fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => e.status(),
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::CalendarGenerationFailed { .. }
            | AppError::SampleOutOfRange { .. }
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::ValidationFailed { invalid_fields } => json!({
                "error": self.to_string(),
                "invalidFields": invalid_fields,
            }),
            AppError::Store(e) => {
                error!(error = %format!("{e:#}"), "store call failed");
                json!({ "error": "internal error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_kinds_split_between_401_and_403() {
        assert_eq!(AuthError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UnknownToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ExpiredToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Forbidden("admin only".into()).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::NotFound("recipe").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::invalid(&["recipeName"]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Duplicate("username").status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::CalendarGenerationFailed { available: 3 }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Store(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_error_lists_fields() {
        let err = AppError::invalid(&["recipeName", "servings"]);
        assert_eq!(err.to_string(), "invalid fields: recipeName, servings");
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
