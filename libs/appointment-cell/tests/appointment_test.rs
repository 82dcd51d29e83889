use assert_matches::assert_matches;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use appointment_cell::handlers::{create_appointment, delete_appointment};
use appointment_cell::models::{
    AppointmentError, AppointmentStatus, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use appointment_cell::services::AppointmentBookingService;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::test_utils::{count_rows, seed_user, test_state};
use shared_utils::validation::ValidatedJson;
use shared_utils::AppState;

struct Fixture {
    state: AppState,
    patient: User,
    doctor: User,
    secretary: User,
}

async fn fixture() -> Fixture {
    let state = test_state().await;
    let patient = seed_user(&state, Role::Patient).await;
    let doctor = seed_user(&state, Role::Doctor).await;
    let secretary = seed_user(&state, Role::Secretary).await;
    Fixture {
        state,
        patient,
        doctor,
        secretary,
    }
}

fn booking(fixture: &Fixture, days_ahead: i64) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        patient_id: fixture.patient.id,
        doctor_id: fixture.doctor.id,
        secretary_id: None,
        date: Utc::now() + Duration::days(days_ahead),
        status: None,
        description: Some("Routine check-up".to_string()),
    }
}

fn status_change(status: AppointmentStatus) -> UpdateAppointmentRequest {
    UpdateAppointmentRequest {
        status: Some(status),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_returns_nested_view() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);

    let view = service
        .create_appointment(booking(&fixture, 1), Some(&fixture.secretary))
        .await
        .unwrap();

    assert_eq!(view.appointment.status, AppointmentStatus::Pending);
    assert_eq!(view.appointment.secretary_id, Some(fixture.secretary.id));
    assert_eq!(view.patient.id, fixture.patient.id);
    assert_eq!(view.patient.tc_no, fixture.patient.tc_no);
    assert_eq!(view.doctor.name, fixture.doctor.name);
    assert_eq!(view.doctor.specialty, "General Practice");
    assert!(view.examination.is_none());
}

#[tokio::test]
async fn test_create_with_unknown_references() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);

    let mut request = booking(&fixture, 1);
    request.doctor_id = Uuid::new_v4();
    assert_matches!(
        service.create_appointment(request, None).await,
        Err(AppointmentError::ReferenceNotFound(entity)) if entity == "doctor"
    );

    // a patient's id is not a doctor id
    let mut request = booking(&fixture, 1);
    request.doctor_id = fixture.patient.id;
    assert_matches!(
        service.create_appointment(request, None).await,
        Err(AppointmentError::ReferenceNotFound(entity)) if entity == "doctor"
    );

    let mut request = booking(&fixture, 1);
    request.secretary_id = Some(Uuid::new_v4());
    assert_matches!(
        service.create_appointment(request, None).await,
        Err(AppointmentError::ReferenceNotFound(entity)) if entity == "secretary"
    );

    assert_eq!(count_rows(&fixture.state, "appointments").await, 0);
}

#[tokio::test]
async fn test_create_rejects_non_pending_status() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);

    let mut request = booking(&fixture, 1);
    request.status = Some(AppointmentStatus::Completed);

    assert_matches!(
        service.create_appointment(request, None).await,
        Err(AppointmentError::InvalidInitialStatus(AppointmentStatus::Completed))
    );
}

#[tokio::test]
async fn test_completing_stamps_completed_at() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);
    let view = service
        .create_appointment(booking(&fixture, 1), None)
        .await
        .unwrap();

    let completed = service
        .update_appointment(view.appointment.id, status_change(AppointmentStatus::Completed))
        .await
        .unwrap();

    assert_eq!(completed.appointment.status, AppointmentStatus::Completed);
    assert!(completed.appointment.completed_at.is_some());
}

#[tokio::test]
async fn test_cancelling_leaves_completed_at_empty() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);
    let view = service
        .create_appointment(booking(&fixture, 1), None)
        .await
        .unwrap();

    let cancelled = service
        .update_appointment(view.appointment.id, status_change(AppointmentStatus::Cancelled))
        .await
        .unwrap();

    assert_eq!(cancelled.appointment.status, AppointmentStatus::Cancelled);
    assert!(cancelled.appointment.completed_at.is_none());
}

#[tokio::test]
async fn test_terminal_appointments_cannot_change() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);
    let view = service
        .create_appointment(booking(&fixture, 1), None)
        .await
        .unwrap();
    let id = view.appointment.id;

    service
        .update_appointment(id, status_change(AppointmentStatus::Completed))
        .await
        .unwrap();

    assert_matches!(
        service
            .update_appointment(id, status_change(AppointmentStatus::Pending))
            .await,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Pending,
        })
    );
    assert_matches!(
        service
            .update_appointment(
                id,
                UpdateAppointmentRequest {
                    date: Some(Utc::now() + Duration::days(7)),
                    ..Default::default()
                },
            )
            .await,
        Err(AppointmentError::TerminalReschedule(AppointmentStatus::Completed))
    );

    // notes on a finished appointment are still editable
    let edited = service
        .update_appointment(
            id,
            UpdateAppointmentRequest {
                description: Some("Follow-up in a month".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.appointment.description, "Follow-up in a month");
    assert_eq!(edited.appointment.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn test_reschedule_pending() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);
    let view = service
        .create_appointment(booking(&fixture, 1), None)
        .await
        .unwrap();
    let new_date = Utc::now() + Duration::days(3);

    let moved = service
        .update_appointment(
            view.appointment.id,
            UpdateAppointmentRequest {
                date: Some(new_date),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.appointment.date, new_date);
    assert_eq!(moved.appointment.status, AppointmentStatus::Pending);
}

#[tokio::test]
async fn test_missing_appointment_is_not_found() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);
    let missing = Uuid::new_v4();

    assert_matches!(service.get_appointment(missing).await, Err(AppointmentError::NotFound));
    assert_matches!(
        service.update_appointment(missing, status_change(AppointmentStatus::Cancelled)).await,
        Err(AppointmentError::NotFound)
    );
    assert_matches!(service.delete_appointment(missing).await, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn test_listings_are_filtered_and_ordered_by_date() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);
    let other_patient = seed_user(&fixture.state, Role::Patient).await;

    let later = service.create_appointment(booking(&fixture, 5), None).await.unwrap();
    let sooner = service.create_appointment(booking(&fixture, 2), None).await.unwrap();
    let mut request = booking(&fixture, 3);
    request.patient_id = other_patient.id;
    let other = service.create_appointment(request, None).await.unwrap();

    service
        .update_appointment(other.appointment.id, status_change(AppointmentStatus::Cancelled))
        .await
        .unwrap();

    let for_patient: Vec<Uuid> = service
        .list_by_patient(fixture.patient.id)
        .await
        .unwrap()
        .into_iter()
        .map(|view| view.appointment.id)
        .collect();
    assert_eq!(for_patient, vec![sooner.appointment.id, later.appointment.id]);

    let for_doctor = service.list_by_doctor(fixture.doctor.id).await.unwrap();
    assert_eq!(for_doctor.len(), 3);

    let cancelled = service.list_all(Some(AppointmentStatus::Cancelled)).await.unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].appointment.id, other.appointment.id);

    assert_eq!(service.list_all(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_listing_unknown_patient_is_reference_error() {
    let fixture = fixture().await;
    let service = AppointmentBookingService::new(&fixture.state);

    assert_matches!(
        service.list_by_patient(Uuid::new_v4()).await,
        Err(AppointmentError::ReferenceNotFound(entity)) if entity == "patient"
    );
}

#[tokio::test]
async fn test_handlers_create_and_delete() {
    let fixture = fixture().await;

    let (status, view) = create_appointment(
        State(fixture.state.clone()),
        Extension(fixture.doctor.clone()),
        ValidatedJson(booking(&fixture, 1)),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    // only secretaries are recorded as the booker
    assert_eq!(view.appointment.secretary_id, None);

    let status = delete_appointment(State(fixture.state.clone()), Path(view.appointment.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = delete_appointment(State(fixture.state.clone()), Path(view.appointment.id))
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}
