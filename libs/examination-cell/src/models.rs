use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared_models::error::AppError;
use shared_utils::validation::validate_not_blank;

pub const DEFAULT_NOTES: &str = "No additional notes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Examination {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An examination from a doctor's history, with the appointment and patient it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DoctorExamination {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub examination: Examination,
    pub appointment_date: DateTime<Utc>,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateExaminationRequest {
    pub appointment_id: Uuid,
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub diagnosis: String,
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub treatment: String,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateExaminationRequest {
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub diagnosis: Option<String>,
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub treatment: Option<String>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExaminationError {
    #[error("Examination not found")]
    NotFound,

    #[error("Referenced {0} not found")]
    ReferenceNotFound(String),

    #[error("Appointment already has an examination")]
    DuplicateExamination,

    #[error("Cannot examine a cancelled appointment")]
    AppointmentCancelled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ExaminationError> for AppError {
    fn from(err: ExaminationError) -> Self {
        match err {
            ExaminationError::NotFound | ExaminationError::ReferenceNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ExaminationError::DuplicateExamination | ExaminationError::AppointmentCancelled => {
                AppError::Conflict(err.to_string())
            }
            ExaminationError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
