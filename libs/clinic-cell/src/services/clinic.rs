use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{constraint_violation, ConstraintViolation, DbPool};
use shared_utils::AppState;

use crate::models::{Clinic, ClinicError, CreateClinicRequest, UpdateClinicRequest};

pub struct ClinicService {
    db: DbPool,
}

impl ClinicService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    pub async fn create_clinic(&self, request: CreateClinicRequest) -> Result<Clinic, ClinicError> {
        debug!("Creating clinic: {}", request.name);

        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO clinics (id, name, created_at) VALUES (?, ?, ?)")
            .bind(clinic.id)
            .bind(&clinic.name)
            .bind(clinic.created_at)
            .execute(&self.db)
            .await?;

        info!("Clinic created with ID: {}", clinic.id);
        Ok(clinic)
    }

    pub async fn list_clinics(&self) -> Result<Vec<Clinic>, ClinicError> {
        let clinics = sqlx::query_as::<_, Clinic>(
            "SELECT id, name, created_at FROM clinics ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(clinics)
    }

    pub async fn get_clinic(&self, clinic_id: Uuid) -> Result<Clinic, ClinicError> {
        sqlx::query_as::<_, Clinic>("SELECT id, name, created_at FROM clinics WHERE id = ?")
            .bind(clinic_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ClinicError::NotFound)
    }

    pub async fn update_clinic(
        &self,
        clinic_id: Uuid,
        request: UpdateClinicRequest,
    ) -> Result<Clinic, ClinicError> {
        debug!("Updating clinic: {}", clinic_id);

        let result = sqlx::query("UPDATE clinics SET name = ? WHERE id = ?")
            .bind(request.name.trim())
            .bind(clinic_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ClinicError::NotFound);
        }

        self.get_clinic(clinic_id).await
    }

    /// Refuses while any doctor still belongs to the clinic.
    pub async fn delete_clinic(&self, clinic_id: Uuid) -> Result<(), ClinicError> {
        debug!("Deleting clinic: {}", clinic_id);

        let result = sqlx::query("DELETE FROM clinics WHERE id = ?")
            .bind(clinic_id)
            .execute(&self.db)
            .await
            .map_err(|e| match constraint_violation(&e) {
                Some(ConstraintViolation::ForeignKey) => {
                    warn!("Refusing to delete clinic {} with assigned doctors", clinic_id);
                    ClinicError::InUse
                }
                _ => ClinicError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(ClinicError::NotFound);
        }

        info!("Clinic deleted: {}", clinic_id);
        Ok(())
    }
}
