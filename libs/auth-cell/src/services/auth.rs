use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::DbPool;
use shared_utils::jwt::JwtError;
use shared_utils::password::verify_password_blocking;
use shared_utils::session::SessionService;
use shared_utils::AppState;

use crate::models::{AuthError, LoginRequest, LoginResponse};

pub struct AuthService {
    db: DbPool,
    sessions: SessionService,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            sessions: SessionService::new(state),
        }
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = request.email.trim().to_lowercase();
        debug!("Login attempt for {}", email);

        let credentials: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE email = ?")
                .bind(&email)
                .fetch_optional(&self.db)
                .await?;

        let Some((user_id, password_hash)) = credentials else {
            warn!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_blocking(request.password, password_hash).await? {
            warn!("Login failed: wrong password for user {}", user_id);
            return Err(AuthError::InvalidCredentials);
        }

        let response = self.start_session(user_id, AuthError::InvalidCredentials).await?;
        info!("User {} logged in", user_id);
        Ok(response)
    }

    /// Trade a refresh token for a new session. Refresh tokens are not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse, AuthError> {
        let user_id = self
            .sessions
            .verify_refresh_token(refresh_token)
            .map_err(|e| match e {
                JwtError::Expired => AuthError::RefreshTokenExpired,
                other => {
                    debug!("Refresh token rejected: {}", other);
                    AuthError::InvalidRefreshToken
                }
            })?;

        let response = self
            .start_session(user_id, AuthError::InvalidRefreshToken)
            .await?;
        info!("Session refreshed for user {}", user_id);
        Ok(response)
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let removed = self
            .sessions
            .end_session(access_token)
            .await?;
        debug!("Logout removed {} session(s)", removed);
        Ok(())
    }

    /// `missing` is returned when the user no longer exists.
    async fn start_session(&self, user_id: Uuid, missing: AuthError) -> Result<LoginResponse, AuthError> {
        let user = self.sessions.load_user(user_id).await?.ok_or(missing)?;
        let tokens = self.sessions.issue_session(user.id).await?;

        Ok(LoginResponse { user, tokens })
    }
}
