use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::AppointmentStatus;
use appointment_cell::services::AppointmentLifecycleService;
use shared_database::{begin_write, constraint_violation, ConstraintViolation, DbPool};
use shared_utils::AppState;

use crate::models::{
    CreateExaminationRequest, DoctorExamination, Examination, ExaminationError,
    UpdateExaminationRequest, DEFAULT_NOTES,
};

const EXAMINATION_COLUMNS: &str =
    "id, appointment_id, diagnosis, treatment, notes, created_at, updated_at";

pub struct ExaminationService {
    db: DbPool,
    lifecycle: AppointmentLifecycleService,
}

impl ExaminationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Record the examination and complete its appointment if still pending, atomically.
    pub async fn create(&self, request: CreateExaminationRequest) -> Result<Examination, ExaminationError> {
        debug!("Creating examination for appointment {}", request.appointment_id);

        let now = Utc::now();
        let examination = Examination {
            id: Uuid::new_v4(),
            appointment_id: request.appointment_id,
            diagnosis: request.diagnosis.trim().to_string(),
            treatment: request.treatment.trim().to_string(),
            notes: request
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty())
                .unwrap_or_else(|| DEFAULT_NOTES.to_string()),
            created_at: now,
            updated_at: now,
        };

        let mut tx = begin_write(&self.db).await?;

        let appointment: Option<(AppointmentStatus, Option<chrono::DateTime<Utc>>)> =
            sqlx::query_as("SELECT status, completed_at FROM appointments WHERE id = ?")
                .bind(examination.appointment_id)
                .fetch_optional(&mut *tx)
                .await?;
        let (status, completed_at) =
            appointment.ok_or_else(|| ExaminationError::ReferenceNotFound("appointment".to_string()))?;

        if status == AppointmentStatus::Cancelled {
            warn!("Examination attempted on cancelled appointment {}", examination.appointment_id);
            return Err(ExaminationError::AppointmentCancelled);
        }

        sqlx::query(
            "INSERT INTO examinations (id, appointment_id, diagnosis, treatment, notes, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(examination.id)
        .bind(examination.appointment_id)
        .bind(&examination.diagnosis)
        .bind(&examination.treatment)
        .bind(&examination.notes)
        .bind(examination.created_at)
        .bind(examination.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match constraint_violation(&e) {
            Some(ConstraintViolation::Unique) => ExaminationError::DuplicateExamination,
            _ => ExaminationError::Database(e),
        })?;

        if status == AppointmentStatus::Pending {
            let completed_at = self.lifecycle.completed_at_for(
                status,
                AppointmentStatus::Completed,
                completed_at,
                now,
            );
            sqlx::query(
                "UPDATE appointments SET status = ?, completed_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(AppointmentStatus::Completed)
            .bind(completed_at)
            .bind(now)
            .bind(examination.appointment_id)
            .execute(&mut *tx)
            .await?;
            info!("Appointment {} completed by examination", examination.appointment_id);
        }

        tx.commit().await?;

        info!("Examination created with ID: {}", examination.id);
        Ok(examination)
    }

    pub async fn update(
        &self,
        examination_id: Uuid,
        request: UpdateExaminationRequest,
    ) -> Result<Examination, ExaminationError> {
        debug!("Updating examination: {}", examination_id);

        let result = sqlx::query(
            "UPDATE examinations SET diagnosis = COALESCE(?, diagnosis), \
             treatment = COALESCE(?, treatment), notes = COALESCE(?, notes), updated_at = ? \
             WHERE id = ?",
        )
        .bind(request.diagnosis.as_deref().map(str::trim))
        .bind(request.treatment.as_deref().map(str::trim))
        .bind(request.notes.as_deref().map(str::trim))
        .bind(Utc::now())
        .bind(examination_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ExaminationError::NotFound);
        }

        self.get_by_id(examination_id).await
    }

    pub async fn delete(&self, examination_id: Uuid) -> Result<(), ExaminationError> {
        debug!("Deleting examination: {}", examination_id);

        let result = sqlx::query("DELETE FROM examinations WHERE id = ?")
            .bind(examination_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ExaminationError::NotFound);
        }

        info!("Examination deleted: {}", examination_id);
        Ok(())
    }

    pub async fn get_by_id(&self, examination_id: Uuid) -> Result<Examination, ExaminationError> {
        let sql = format!("SELECT {} FROM examinations WHERE id = ?", EXAMINATION_COLUMNS);
        sqlx::query_as::<_, Examination>(&sql)
            .bind(examination_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ExaminationError::NotFound)
    }

    pub async fn get_by_appointment_id(&self, appointment_id: Uuid) -> Result<Examination, ExaminationError> {
        let sql = format!(
            "SELECT {} FROM examinations WHERE appointment_id = ?",
            EXAMINATION_COLUMNS
        );
        sqlx::query_as::<_, Examination>(&sql)
            .bind(appointment_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ExaminationError::NotFound)
    }

    /// All examinations of a doctor's appointments, newest first.
    pub async fn get_by_doctor_id(&self, doctor_id: Uuid) -> Result<Vec<DoctorExamination>, ExaminationError> {
        let doctor: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM doctors WHERE user_id = ?")
            .bind(doctor_id)
            .fetch_optional(&self.db)
            .await?;
        if doctor.is_none() {
            return Err(ExaminationError::ReferenceNotFound("doctor".to_string()));
        }

        let examinations = sqlx::query_as::<_, DoctorExamination>(
            "SELECT e.id, e.appointment_id, e.diagnosis, e.treatment, e.notes, e.created_at, e.updated_at, \
                    a.date AS appointment_date, a.patient_id, p.name AS patient_name, p.email AS patient_email \
             FROM examinations e \
             JOIN appointments a ON a.id = e.appointment_id \
             JOIN patients p ON p.user_id = a.patient_id \
             WHERE a.doctor_id = ? \
             ORDER BY e.created_at DESC, e.rowid DESC",
        )
        .bind(doctor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(examinations)
    }
}
