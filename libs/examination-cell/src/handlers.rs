use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::validation::ValidatedJson;
use shared_utils::AppState;

use crate::models::{CreateExaminationRequest, DoctorExamination, Examination, UpdateExaminationRequest};
use crate::services::ExaminationService;

#[axum::debug_handler]
pub async fn create_examination(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateExaminationRequest>,
) -> Result<(StatusCode, Json<Examination>), AppError> {
    let examination = ExaminationService::new(&state).create(request).await?;
    Ok((StatusCode::CREATED, Json(examination)))
}

#[axum::debug_handler]
pub async fn get_examination(
    State(state): State<AppState>,
    Path(examination_id): Path<Uuid>,
) -> Result<Json<Examination>, AppError> {
    let examination = ExaminationService::new(&state).get_by_id(examination_id).await?;
    Ok(Json(examination))
}

#[axum::debug_handler]
pub async fn update_examination(
    State(state): State<AppState>,
    Path(examination_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateExaminationRequest>,
) -> Result<Json<Examination>, AppError> {
    let examination = ExaminationService::new(&state)
        .update(examination_id, request)
        .await?;
    Ok(Json(examination))
}

#[axum::debug_handler]
pub async fn delete_examination(
    State(state): State<AppState>,
    Path(examination_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ExaminationService::new(&state).delete(examination_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_appointment_examination(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Examination>, AppError> {
    let examination = ExaminationService::new(&state)
        .get_by_appointment_id(appointment_id)
        .await?;
    Ok(Json(examination))
}

#[axum::debug_handler]
pub async fn get_doctor_examinations(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Vec<DoctorExamination>>, AppError> {
    let examinations = ExaminationService::new(&state)
        .get_by_doctor_id(doctor_id)
        .await?;
    Ok(Json(examinations))
}
