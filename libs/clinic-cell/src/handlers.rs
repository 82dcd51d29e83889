use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::validation::ValidatedJson;
use shared_utils::AppState;

use crate::models::{Clinic, CreateClinicRequest, UpdateClinicRequest};
use crate::services::ClinicService;

#[axum::debug_handler]
pub async fn create_clinic(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateClinicRequest>,
) -> Result<(StatusCode, Json<Clinic>), AppError> {
    let clinic = ClinicService::new(&state).create_clinic(request).await?;
    Ok((StatusCode::CREATED, Json(clinic)))
}

#[axum::debug_handler]
pub async fn list_clinics(State(state): State<AppState>) -> Result<Json<Vec<Clinic>>, AppError> {
    let clinics = ClinicService::new(&state).list_clinics().await?;
    Ok(Json(clinics))
}

#[axum::debug_handler]
pub async fn get_clinic(
    State(state): State<AppState>,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Clinic>, AppError> {
    let clinic = ClinicService::new(&state).get_clinic(clinic_id).await?;
    Ok(Json(clinic))
}

#[axum::debug_handler]
pub async fn update_clinic(
    State(state): State<AppState>,
    Path(clinic_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateClinicRequest>,
) -> Result<Json<Clinic>, AppError> {
    let clinic = ClinicService::new(&state)
        .update_clinic(clinic_id, request)
        .await?;
    Ok(Json(clinic))
}

#[axum::debug_handler]
pub async fn delete_clinic(
    State(state): State<AppState>,
    Path(clinic_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClinicService::new(&state).delete_clinic(clinic_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
