use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_utils::policy::{Access, SECRETARIES};
use shared_utils::AppState;

use crate::handlers;

pub fn clinic_routes(state: AppState) -> Router {
    // listing is open so the registration form can offer clinics
    let public_routes = Router::new()
        .route("/", get(handlers::list_clinics))
        .route("/{id}", get(handlers::get_clinic));

    let secretary_routes = Router::new()
        .route("/", post(handlers::create_clinic))
        .route(
            "/{id}",
            patch(handlers::update_clinic).delete(handlers::delete_clinic),
        );

    Router::new()
        .merge(Access::Public.apply(public_routes, &state))
        .merge(Access::Roles(SECRETARIES).apply(secretary_routes, &state))
        .with_state(state)
}
