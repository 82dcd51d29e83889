use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::debug;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::MaybeUser;
use shared_utils::validation::ValidatedJson;
use shared_utils::AppState;

use crate::models::{CreateUserRequest, DoctorSummary, PatientSummary, UpdateUserRequest, UserAccount};
use crate::services::UserService;

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserAccount>), AppError> {
    let account = UserService::new(&state)
        .register(caller.as_ref(), request)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<AppState>) -> Result<Json<Vec<DoctorSummary>>, AppError> {
    let doctors = UserService::new(&state).list_doctors().await?;
    Ok(Json(doctors))
}

#[axum::debug_handler]
pub async fn list_patients(State(state): State<AppState>) -> Result<Json<Vec<PatientSummary>>, AppError> {
    let patients = UserService::new(&state).list_patients().await?;
    Ok(Json(patients))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(tc_no): Path<String>,
) -> Result<Json<UserAccount>, AppError> {
    let account = UserService::new(&state).get_user_by_tc(&tc_no).await?;
    Ok(Json(account))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(tc_no): Path<String>,
    Extension(user): Extension<User>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserAccount>, AppError> {
    debug!("User {} updating account {}", user.id, tc_no);

    let service = UserService::new(&state);
    service.ensure_can_modify(&user, &tc_no)?;

    let account = service.update_user_by_tc(&tc_no, request).await?;
    Ok(Json(account))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(tc_no): Path<String>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, AppError> {
    let service = UserService::new(&state);
    service.ensure_can_modify(&user, &tc_no)?;

    service.delete_user_by_tc(&tc_no).await?;
    Ok(StatusCode::NO_CONTENT)
}
