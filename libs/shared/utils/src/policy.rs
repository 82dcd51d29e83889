//! Route access policy.
//!
//! Every cell router groups its routes by [`Access`] and applies the policy
//! through [`Access::apply`], so authentication and role checks happen at the
//! routing layer rather than inside handlers.

use axum::{middleware, Router};

use shared_models::auth::Role;

use crate::extractor::{auth_middleware, optional_auth_middleware, require_roles};
use crate::state::AppState;

pub const STAFF: &[Role] = &[Role::Doctor, Role::Secretary];
pub const DOCTORS: &[Role] = &[Role::Doctor];
pub const SECRETARIES: &[Role] = &[Role::Secretary];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Authenticates when a bearer token is sent, anonymous otherwise.
    OptionalAuth,
    Authenticated,
    Roles(&'static [Role]),
}

impl Access {
    pub fn apply(self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        match self {
            Access::Public => router,
            Access::OptionalAuth => router.layer(middleware::from_fn_with_state(
                state.clone(),
                optional_auth_middleware,
            )),
            Access::Authenticated => {
                router.layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            }
            // outermost layer runs first: authenticate, then check the role
            Access::Roles(roles) => router
                .layer(middleware::from_fn_with_state(roles, require_roles))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    use crate::session::SessionService;
    use crate::test_utils::{seed_user, test_state};

    fn doctor_only(state: &AppState) -> Router {
        let routes = Router::new().route("/", get(|| async { "ok" }));
        Access::Roles(DOCTORS).apply(routes, state).with_state(state.clone())
    }

    fn get_with(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_roles_policy_rejects_anonymous() {
        let state = test_state().await;
        let response = doctor_only(&state).oneshot(get_with(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_roles_policy_rejects_wrong_role() {
        let state = test_state().await;
        let patient = seed_user(&state, Role::Patient).await;
        let tokens = SessionService::new(&state).issue_session(patient.id).await.unwrap();

        let response = doctor_only(&state)
            .oneshot(get_with(Some(&tokens.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_roles_policy_admits_role() {
        let state = test_state().await;
        let doctor = seed_user(&state, Role::Doctor).await;
        let tokens = SessionService::new(&state).issue_session(doctor.id).await.unwrap();

        let response = doctor_only(&state)
            .oneshot(get_with(Some(&tokens.access_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_optional_auth_admits_anonymous() {
        let state = test_state().await;
        let routes = Router::new().route("/", get(|| async { "ok" }));
        let app = Access::OptionalAuth.apply(routes, &state).with_state(state.clone());

        let response = app.clone().oneshot(get_with(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_with(Some("not.a.token"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
