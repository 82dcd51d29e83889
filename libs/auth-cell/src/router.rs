use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::policy::Access;
use shared_utils::AppState;

use crate::handlers;

pub fn auth_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me));

    Router::new()
        .merge(Access::Public.apply(public_routes, &state))
        .merge(Access::Authenticated.apply(protected_routes, &state))
        .with_state(state)
}
