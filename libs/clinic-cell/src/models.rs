use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared_models::error::AppError;
use shared_utils::validation::validate_not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateClinicRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateClinicRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    #[error("Clinic not found")]
    NotFound,

    #[error("Clinic still has doctors assigned")]
    InUse,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::NotFound => AppError::NotFound(err.to_string()),
            ClinicError::InUse => AppError::Conflict(err.to_string()),
            ClinicError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
