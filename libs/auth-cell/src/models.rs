use serde::{Deserialize, Serialize};
use validator::Validate;

use shared_models::auth::{TokenPair, User};
use shared_models::error::AppError;
use shared_utils::password::PasswordError;
use shared_utils::session::SessionError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// `{ user, accessToken, refreshToken }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token expired")]
    RefreshTokenExpired,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenExpired => AppError::Auth(err.to_string()),
            AuthError::Password(e) => AppError::Internal(e.to_string()),
            AuthError::Session(e) => e.into(),
            AuthError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
