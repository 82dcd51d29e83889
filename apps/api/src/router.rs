use axum::{middleware, routing::get, Router};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use clinic_cell::router::clinic_routes;
use examination_cell::router::examination_routes;
use shared_utils::rate_limit::rate_limit_middleware;
use shared_utils::AppState;
use user_cell::router::user_routes;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/examinations", examination_routes(state.clone()))
        .nest("/clinics", clinic_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
}
