use axum::{
    routing::{get, patch},
    Router,
};

use shared_utils::policy::{Access, STAFF};
use shared_utils::AppState;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/{appointment_id}",
            patch(handlers::update_appointment).delete(handlers::delete_appointment),
        );

    let protected_routes = Router::new()
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/patient/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_appointments));

    Router::new()
        .merge(Access::Roles(STAFF).apply(staff_routes, &state))
        .merge(Access::Authenticated.apply(protected_routes, &state))
        .with_state(state)
}
