use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::password::PasswordError;
use shared_utils::validation::{validate_not_blank, validate_tc_no};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(custom(function = "validate_tc_no"))]
    pub tc_no: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: Role,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 200))]
    pub specialty: Option<String>,
    pub clinic_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 200))]
    pub specialty: Option<String>,
    pub clinic_id: Option<Uuid>,
}

// ==============================================================================
// DOMAIN MODELS
// ==============================================================================

/// Role-specific data supplied at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleProfile {
    Doctor { specialty: String, clinic_id: Uuid },
    Secretary,
    Patient,
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Doctor { .. } => Role::Doctor,
            RoleProfile::Secretary => Role::Secretary,
            RoleProfile::Patient => Role::Patient,
        }
    }
}

/// A creation request whose role-specific fields have been checked.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub tc_no: String,
    pub email: String,
    pub password: String,
    pub birth_date: Option<NaiveDate>,
    pub profile: RoleProfile,
}

impl TryFrom<CreateUserRequest> for NewUser {
    type Error = UserError;

    fn try_from(request: CreateUserRequest) -> Result<Self, Self::Error> {
        let profile = match request.role {
            Role::Doctor => match (request.specialty, request.clinic_id) {
                (Some(specialty), Some(clinic_id)) if !specialty.trim().is_empty() => {
                    RoleProfile::Doctor {
                        specialty: specialty.trim().to_string(),
                        clinic_id,
                    }
                }
                _ => {
                    return Err(UserError::MissingRoleFields(
                        "specialty and clinic_id are required for doctors".to_string(),
                    ))
                }
            },
            Role::Secretary | Role::Patient
                if request.specialty.is_some() || request.clinic_id.is_some() =>
            {
                return Err(UserError::MissingRoleFields(
                    "specialty and clinic_id only apply to doctors".to_string(),
                ))
            }
            Role::Secretary => RoleProfile::Secretary,
            Role::Patient => RoleProfile::Patient,
        };

        Ok(NewUser {
            name: request.name.trim().to_string(),
            tc_no: request.tc_no,
            email: request.email.trim().to_lowercase(),
            password: request.password,
            birth_date: request.birth_date,
            profile,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DoctorRecord {
    pub specialty: String,
    pub clinic_id: Uuid,
    pub clinic_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretaryRecord {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PatientRecord {
    pub name: String,
    pub email: String,
}

/// The role row stored alongside a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRecord {
    Doctor(DoctorRecord),
    Secretary(SecretaryRecord),
    Patient(PatientRecord),
}

/// A user with its role row, e.g. `{ "id": ..., "role": "doctor", "doctor": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub record: RoleRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    pub tc_no: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub joined_at: DateTime<Utc>,
    pub specialty: String,
    pub clinic_id: Uuid,
    pub clinic_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub tc_no: String,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub joined_at: DateTime<Utc>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("User with this {0} already exists")]
    DuplicateUser(String),

    #[error("Missing or invalid role fields: {0}")]
    MissingRoleFields(String),

    #[error("Referenced {0} not found")]
    ReferenceNotFound(String),

    #[error("User is still referenced by appointments")]
    InUse,

    #[error("{0}")]
    Forbidden(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound | UserError::ReferenceNotFound(_) => AppError::NotFound(err.to_string()),
            UserError::DuplicateUser(_) | UserError::InUse => AppError::Conflict(err.to_string()),
            UserError::MissingRoleFields(_) => AppError::ValidationError(err.to_string()),
            UserError::Forbidden(msg) => AppError::Forbidden(msg),
            UserError::Password(e) => AppError::Internal(e.to_string()),
            UserError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
