use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::DbPool;
use shared_models::auth::{Role, User};
use shared_utils::AppState;

use crate::models::{
    Appointment, AppointmentError, AppointmentRow, AppointmentStatus, AppointmentView,
    CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;

const VIEW_QUERY: &str = "\
    SELECT a.id, a.patient_id, a.doctor_id, a.secretary_id, a.date, a.status, a.description, \
           a.completed_at, a.created_at, a.updated_at, \
           p.name AS patient_name, p.email AS patient_email, pu.tc_no AS patient_tc_no, \
           du.name AS doctor_name, du.email AS doctor_email, d.specialty AS doctor_specialty, \
           d.clinic_id AS doctor_clinic_id, c.name AS doctor_clinic_name, \
           e.id AS examination_id, e.diagnosis AS examination_diagnosis, \
           e.treatment AS examination_treatment, e.created_at AS examination_created_at \
    FROM appointments a \
    JOIN patients p ON p.user_id = a.patient_id \
    JOIN users pu ON pu.id = a.patient_id \
    JOIN doctors d ON d.user_id = a.doctor_id \
    JOIN users du ON du.id = a.doctor_id \
    JOIN clinics c ON c.id = d.clinic_id \
    LEFT JOIN examinations e ON e.appointment_id = a.id";

pub struct AppointmentBookingService {
    db: DbPool,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Book a pending appointment. A secretary booking without naming a secretary is recorded as the booker.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        booked_by: Option<&User>,
    ) -> Result<AppointmentView, AppointmentError> {
        debug!(
            "Booking appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        if let Some(status) = request.status {
            if status != AppointmentStatus::Pending {
                return Err(AppointmentError::InvalidInitialStatus(status));
            }
        }

        let secretary_id = request.secretary_id.or_else(|| {
            booked_by
                .filter(|user| user.has_role(Role::Secretary))
                .map(|user| user.id)
        });

        self.ensure_exists("patients", "patient", request.patient_id).await?;
        self.ensure_exists("doctors", "doctor", request.doctor_id).await?;
        if let Some(secretary_id) = secretary_id {
            self.ensure_exists("secretaries", "secretary", secretary_id).await?;
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            secretary_id,
            date: request.date,
            status: AppointmentStatus::Pending,
            description: request.description.unwrap_or_default(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO appointments \
             (id, patient_id, doctor_id, secretary_id, date, status, description, completed_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(appointment.id)
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(appointment.secretary_id)
        .bind(appointment.date)
        .bind(appointment.status)
        .bind(&appointment.description)
        .bind(appointment.completed_at)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.db)
        .await?;

        info!("Appointment booked with ID: {}", appointment.id);
        self.get_appointment(appointment.id).await
    }

    pub async fn update_appointment(
        &self,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<AppointmentView, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.fetch_appointment(appointment_id).await?;
        let new_status = request.status.unwrap_or(current.status);

        self.lifecycle
            .validate_status_transition(current.status, new_status)?;
        if request.date.is_some_and(|date| date != current.date) {
            self.lifecycle.validate_reschedule(current.status)?;
        }

        let now = Utc::now();
        let completed_at =
            self.lifecycle
                .completed_at_for(current.status, new_status, current.completed_at, now);

        let result = sqlx::query(
            "UPDATE appointments SET status = ?, completed_at = ?, date = COALESCE(?, date), \
             description = COALESCE(?, description), updated_at = ? WHERE id = ?",
        )
        .bind(new_status)
        .bind(completed_at)
        .bind(request.date)
        .bind(request.description)
        .bind(now)
        .bind(appointment_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppointmentError::NotFound);
        }

        if current.status != new_status {
            info!("Appointment {} moved from {} to {}", appointment_id, current.status, new_status);
        }
        self.get_appointment(appointment_id).await
    }

    /// Hard delete; the examination row cascades.
    pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), AppointmentError> {
        debug!("Deleting appointment: {}", appointment_id);

        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(appointment_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment deleted: {}", appointment_id);
        Ok(())
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<AppointmentView, AppointmentError> {
        let sql = format!("{} WHERE a.id = ?", VIEW_QUERY);
        sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(appointment_id)
            .fetch_optional(&self.db)
            .await?
            .map(AppointmentView::from)
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_by_patient(&self, patient_id: Uuid) -> Result<Vec<AppointmentView>, AppointmentError> {
        self.ensure_exists("patients", "patient", patient_id).await?;
        self.list_where("a.patient_id = ?", patient_id).await
    }

    pub async fn list_by_doctor(&self, doctor_id: Uuid) -> Result<Vec<AppointmentView>, AppointmentError> {
        self.ensure_exists("doctors", "doctor", doctor_id).await?;
        self.list_where("a.doctor_id = ?", doctor_id).await
    }

    pub async fn list_all(
        &self,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        let sql = format!("{} WHERE (? IS NULL OR a.status = ?) ORDER BY a.date", VIEW_QUERY);
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(status)
            .bind(status)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(AppointmentView::from).collect())
    }

    async fn list_where(&self, filter: &str, id: Uuid) -> Result<Vec<AppointmentView>, AppointmentError> {
        let sql = format!("{} WHERE {} ORDER BY a.date", VIEW_QUERY, filter);
        let rows = sqlx::query_as::<_, AppointmentRow>(&sql)
            .bind(id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(AppointmentView::from).collect())
    }

    async fn fetch_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        sqlx::query_as::<_, Appointment>(
            "SELECT id, patient_id, doctor_id, secretary_id, date, status, description, \
                    completed_at, created_at, updated_at \
             FROM appointments WHERE id = ?",
        )
        .bind(appointment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppointmentError::NotFound)
    }

    /// Role tables are keyed by `user_id`.
    async fn ensure_exists(&self, table: &str, entity: &str, user_id: Uuid) -> Result<(), AppointmentError> {
        let sql = format!("SELECT user_id FROM {} WHERE user_id = ?", table);
        let found: Option<(Uuid,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(AppointmentError::ReferenceNotFound(entity.to_string())),
        }
    }
}
