use assert_matches::assert_matches;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use clinic_cell::handlers::{create_clinic, delete_clinic, get_clinic, list_clinics};
use clinic_cell::models::{ClinicError, CreateClinicRequest, UpdateClinicRequest};
use clinic_cell::services::ClinicService;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::test_utils::{count_rows, seed_clinic, seed_user_in_clinic, test_state};
use shared_utils::validation::ValidatedJson;

fn create_request(name: &str) -> CreateClinicRequest {
    CreateClinicRequest {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_rename_then_get_keeps_id() {
    let state = test_state().await;
    let service = ClinicService::new(&state);

    let clinic = service.create_clinic(create_request("Cardiology Wing")).await.unwrap();
    let updated = service
        .update_clinic(
            clinic.id,
            UpdateClinicRequest {
                name: "Cardiology Center".to_string(),
            },
        )
        .await
        .unwrap();

    let fetched = service.get_clinic(clinic.id).await.unwrap();
    assert_eq!(fetched.id, clinic.id);
    assert_eq!(fetched.name, "Cardiology Center");
    assert_eq!(updated, fetched);
}

#[tokio::test]
async fn test_list_is_sorted_by_name() {
    let state = test_state().await;
    let service = ClinicService::new(&state);

    service.create_clinic(create_request("Orthopedics")).await.unwrap();
    service.create_clinic(create_request("Dermatology")).await.unwrap();

    let names: Vec<String> = service
        .list_clinics()
        .await
        .unwrap()
        .into_iter()
        .map(|clinic| clinic.name)
        .collect();
    assert_eq!(names, vec!["Dermatology", "Orthopedics"]);
}

#[tokio::test]
async fn test_missing_clinic_is_not_found() {
    let state = test_state().await;
    let service = ClinicService::new(&state);
    let missing = Uuid::new_v4();

    assert_matches!(service.get_clinic(missing).await, Err(ClinicError::NotFound));
    assert_matches!(
        service
            .update_clinic(missing, UpdateClinicRequest { name: "X".to_string() })
            .await,
        Err(ClinicError::NotFound)
    );
    assert_matches!(service.delete_clinic(missing).await, Err(ClinicError::NotFound));
}

#[tokio::test]
async fn test_delete_clinic_with_doctors_fails_and_keeps_doctor() {
    let state = test_state().await;
    let clinic_id = seed_clinic(&state, "Neurology").await;
    seed_user_in_clinic(&state, Role::Doctor, Some(clinic_id)).await;

    let result = ClinicService::new(&state).delete_clinic(clinic_id).await;

    assert_matches!(result, Err(ClinicError::InUse));
    assert_eq!(count_rows(&state, "doctors").await, 1);
    assert_eq!(count_rows(&state, "clinics").await, 1);
}

#[tokio::test]
async fn test_delete_empty_clinic() {
    let state = test_state().await;
    let clinic_id = seed_clinic(&state, "Pediatrics").await;

    let status = delete_clinic(State(state.clone()), Path(clinic_id)).await.unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_matches!(
        get_clinic(State(state), Path(clinic_id)).await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn test_create_handler_returns_created() {
    let state = test_state().await;

    let (status, clinic) = create_clinic(
        State(state.clone()),
        ValidatedJson(create_request("  Radiology  ")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(clinic.0.name, "Radiology");

    let listed = list_clinics(State(state)).await.unwrap();
    assert_eq!(listed.0.len(), 1);
}

#[tokio::test]
async fn test_in_use_maps_to_conflict() {
    let state = test_state().await;
    let clinic_id = seed_clinic(&state, "Oncology").await;
    seed_user_in_clinic(&state, Role::Doctor, Some(clinic_id)).await;

    let result = delete_clinic(State(state), Path(clinic_id)).await;

    assert_matches!(result, Err(AppError::Conflict(_)));
}
