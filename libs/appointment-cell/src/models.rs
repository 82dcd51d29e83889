use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub secretary_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub description: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub tc_no: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialty: String,
    pub clinic_id: Uuid,
    pub clinic_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExaminationSummary {
    pub id: Uuid,
    pub diagnosis: String,
    pub treatment: String,
    pub created_at: DateTime<Utc>,
}

/// An appointment with the patient, doctor and examination it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: PatientInfo,
    pub doctor: DoctorInfo,
    pub examination: Option<ExaminationSummary>,
}

/// Flat row of the joined appointment query.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AppointmentRow {
    #[sqlx(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_tc_no: String,
    pub doctor_name: String,
    pub doctor_email: String,
    pub doctor_specialty: String,
    pub doctor_clinic_id: Uuid,
    pub doctor_clinic_name: String,
    pub examination_id: Option<Uuid>,
    pub examination_diagnosis: Option<String>,
    pub examination_treatment: Option<String>,
    pub examination_created_at: Option<DateTime<Utc>>,
}

impl From<AppointmentRow> for AppointmentView {
    fn from(row: AppointmentRow) -> Self {
        let examination = match (
            row.examination_id,
            row.examination_diagnosis,
            row.examination_treatment,
            row.examination_created_at,
        ) {
            (Some(id), Some(diagnosis), Some(treatment), Some(created_at)) => Some(ExaminationSummary {
                id,
                diagnosis,
                treatment,
                created_at,
            }),
            _ => None,
        };

        AppointmentView {
            patient: PatientInfo {
                id: row.appointment.patient_id,
                name: row.patient_name,
                email: row.patient_email,
                tc_no: row.patient_tc_no,
            },
            doctor: DoctorInfo {
                id: row.appointment.doctor_id,
                name: row.doctor_name,
                email: row.doctor_email,
                specialty: row.doctor_specialty,
                clinic_id: row.doctor_clinic_id,
                clinic_name: row.doctor_clinic_name,
            },
            appointment: row.appointment,
            examination,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub secretary_id: Option<Uuid>,
    pub date: DateTime<Utc>,
    pub status: Option<AppointmentStatus>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Referenced {0} not found")]
    ReferenceNotFound(String),

    #[error("New appointments must start as pending, got {0}")]
    InvalidInitialStatus(AppointmentStatus),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("A {0} appointment cannot be rescheduled")]
    TerminalReschedule(AppointmentStatus),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound | AppointmentError::ReferenceNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::InvalidInitialStatus(_) => AppError::ValidationError(err.to_string()),
            AppointmentError::InvalidStatusTransition { .. } | AppointmentError::TerminalReschedule(_) => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
