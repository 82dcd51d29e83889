use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::policy::Access;
use shared_utils::AppState;

use crate::handlers;

pub fn user_routes(state: AppState) -> Router {
    // registration; the handler decides which roles the caller may create
    let registration_routes = Router::new().route("/", post(handlers::create_user));

    let protected_routes = Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/patients", get(handlers::list_patients))
        .route(
            "/{tc}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        );

    Router::new()
        .merge(Access::OptionalAuth.apply(registration_routes, &state))
        .merge(Access::Authenticated.apply(protected_routes, &state))
        .with_state(state)
}
