use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use headers::{authorization::Bearer, Authorization, HeaderMapExt};
use tracing::debug;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;

use crate::session::{SessionService, SessionStatus};
use crate::state::AppState;

/// The raw bearer token of an authenticated request, kept so logout can end that session.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// The caller if [`optional_auth_middleware`] authenticated one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<User>().cloned()))
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    match headers.typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) if !bearer.token().trim().is_empty() => {
            Ok(Some(bearer.token().trim().to_string()))
        }
        _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

async fn authenticate(state: &AppState, token: &str) -> Result<User, AppError> {
    match SessionService::new(state).verify_session(token).await? {
        SessionStatus::Valid(user) => Ok(user),
        SessionStatus::Expired => Err(AppError::Auth("Token expired".to_string())),
        SessionStatus::Invalid => Err(AppError::Auth("Invalid or expired session".to_string())),
    }
}

/// Require a live session; attaches [`User`] and [`SessionToken`] to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let user = authenticate(&state, &token).await?;
    debug!("Authenticated user {} ({})", user.id, user.role);

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(SessionToken(token));

    Ok(next.run(request).await)
}

/// Like [`auth_middleware`] but lets anonymous requests through.
/// A bearer token that is present but invalid is still rejected.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = extract_bearer_token(request.headers())? {
        let user = authenticate(&state, &token).await?;
        request.extensions_mut().insert(user);
        request.extensions_mut().insert(SessionToken(token));
    }

    Ok(next.run(request).await)
}

/// Must run inside [`auth_middleware`].
pub async fn require_roles(
    State(roles): State<&'static [Role]>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;

    if !roles.contains(&user.role) {
        debug!("User {} with role {} denied; requires {:?}", user.id, user.role, roles);
        return Err(AppError::Forbidden(format!(
            "Role {} is not allowed to perform this action",
            user.role
        )));
    }

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}
