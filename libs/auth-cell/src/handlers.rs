use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::SessionToken;
use shared_utils::validation::ValidatedJson;
use shared_utils::AppState;

use crate::models::{LoginRequest, LoginResponse, RefreshRequest};
use crate::services::AuthService;

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::new(&state).login(request).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::new(&state)
        .refresh(&request.refresh_token)
        .await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<Json<Value>, AppError> {
    debug!("Logging out user {}", user.id);

    AuthService::new(&state).logout(&token).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

#[axum::debug_handler]
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
