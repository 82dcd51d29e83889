use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::validation::ValidatedJson;
use shared_utils::AppState;

use crate::models::{AppointmentQuery, AppointmentView, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::AppointmentBookingService;

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentView>), AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .create_appointment(request, Some(&user))
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = AppointmentBookingService::new(&state)
        .list_all(query.status)
        .await?;
    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<AppointmentView>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .get_appointment(appointment_id)
        .await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentView>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .update_appointment(appointment_id, request)
        .await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    AppointmentBookingService::new(&state)
        .delete_appointment(appointment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = AppointmentBookingService::new(&state)
        .list_by_patient(patient_id)
        .await?;
    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let appointments = AppointmentBookingService::new(&state)
        .list_by_doctor(doctor_id)
        .await?;
    Ok(Json(appointments))
}
