use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_utils::policy::{Access, DOCTORS};
use shared_utils::AppState;

use crate::handlers;

pub fn examination_routes(state: AppState) -> Router {
    let doctor_routes = Router::new()
        .route("/", post(handlers::create_examination))
        .route(
            "/{examination_id}",
            patch(handlers::update_examination).delete(handlers::delete_examination),
        );

    let protected_routes = Router::new()
        .route("/{examination_id}", get(handlers::get_examination))
        .route(
            "/appointment/{appointment_id}",
            get(handlers::get_appointment_examination),
        )
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_examinations));

    Router::new()
        .merge(Access::Roles(DOCTORS).apply(doctor_routes, &state))
        .merge(Access::Authenticated.apply(protected_routes, &state))
        .with_state(state)
}
