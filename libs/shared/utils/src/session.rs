use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DbPool;
use shared_models::auth::{TokenKind, TokenPair, User};
use shared_models::error::AppError;

use crate::jwt::{self, JwtError};
use crate::state::AppState;

/// Outcome of checking an access token against its persisted session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Valid(User),
    /// Signature checks out but the token is past `exp`; the client should refresh.
    Expired,
    Invalid,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Token(e) => AppError::Internal(e.to_string()),
            SessionError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}

/// Columns selected into [`User`].
pub const USER_PROFILE_COLUMNS: &str =
    "id, name, tc_no, email, role, birth_date, joined_at";

pub struct SessionService {
    db: DbPool,
    config: Arc<AppConfig>,
}

impl SessionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            config: state.config.clone(),
        }
    }

    /// Mint an access/refresh pair for `user_id` and persist a session for the access token.
    pub async fn issue_session(&self, user_id: Uuid) -> Result<TokenPair, SessionError> {
        debug!("Issuing session for user: {}", user_id);

        let access_claims = jwt::new_claims(
            user_id,
            TokenKind::Access,
            Duration::minutes(self.config.access_token_ttl_minutes),
        );
        let refresh_claims = jwt::new_claims(
            user_id,
            TokenKind::Refresh,
            Duration::days(self.config.refresh_token_ttl_days),
        );

        let access_token = jwt::sign_token(&access_claims, &self.config.jwt_secret)?;
        let refresh_token = jwt::sign_token(&refresh_claims, &self.config.jwt_secret)?;

        let expires_at = DateTime::from_timestamp(access_claims.exp, 0)
            .unwrap_or_else(|| Utc::now() + Duration::minutes(self.config.access_token_ttl_minutes));

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
            .bind(&access_token)
            .bind(user_id)
            .bind(expires_at)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        info!("Session issued for user: {}", user_id);

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub async fn verify_session(&self, token: &str) -> Result<SessionStatus, SessionError> {
        let claims = match jwt::validate_token(token, &self.config.jwt_secret) {
            Ok(claims) => claims,
            Err(JwtError::Expired) => return Ok(SessionStatus::Expired),
            Err(JwtError::MissingSecret) => return Err(JwtError::MissingSecret.into()),
            Err(e) => {
                debug!("Rejecting token: {}", e);
                return Ok(SessionStatus::Invalid);
            }
        };

        if claims.typ != TokenKind::Access {
            debug!("Rejecting {:?} token used as access token", claims.typ);
            return Ok(SessionStatus::Invalid);
        }

        let session: Option<(Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT user_id, expires_at FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.db)
                .await?;

        let Some((user_id, expires_at)) = session else {
            debug!("No session row for token of user: {}", claims.sub);
            return Ok(SessionStatus::Invalid);
        };

        if user_id != claims.sub {
            warn!("Session row owner {} does not match token subject {}", user_id, claims.sub);
            return Ok(SessionStatus::Invalid);
        }

        if expires_at <= Utc::now() {
            debug!("Session for user {} expired at {}", user_id, expires_at);
            self.end_session(token).await?;
            return Ok(SessionStatus::Invalid);
        }

        match self.load_user(user_id).await? {
            Some(user) => Ok(SessionStatus::Valid(user)),
            None => Ok(SessionStatus::Invalid),
        }
    }

    /// Delete every session row for `token`. Deleting nothing is not an error.
    pub async fn end_session(&self, token: &str) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.db)
            .await?;

        debug!("Ended {} session(s)", result.rows_affected());
        Ok(result.rows_affected())
    }

    pub async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        if result.rows_affected() > 0 {
            info!("Purged {} expired session(s)", result.rows_affected());
        }
        Ok(result.rows_affected())
    }

    /// Decode a refresh token, returning its subject. Refresh tokens are not persisted.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Uuid, JwtError> {
        let claims = jwt::validate_token(token, &self.config.jwt_secret)?;
        if claims.typ != TokenKind::Refresh {
            return Err(JwtError::Malformed);
        }
        Ok(claims.sub)
    }

    pub async fn load_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_PROFILE_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::auth::Role;

    use crate::test_utils::{seed_user, test_state, JwtTestUtils};

    #[tokio::test]
    async fn test_issue_then_verify_returns_same_user() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Patient).await;
        let sessions = SessionService::new(&state);

        let tokens = sessions.issue_session(user.id).await.unwrap();
        let status = sessions.verify_session(&tokens.access_token).await.unwrap();

        assert_matches!(status, SessionStatus::Valid(found) if found.id == user.id);
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Doctor).await;
        let sessions = SessionService::new(&state);

        let tokens = sessions.issue_session(user.id).await.unwrap();
        assert_eq!(sessions.end_session(&tokens.access_token).await.unwrap(), 1);

        let status = sessions.verify_session(&tokens.access_token).await.unwrap();
        assert_eq!(status, SessionStatus::Invalid);

        // idempotent
        assert_eq!(sessions.end_session(&tokens.access_token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_is_sentinel() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Patient).await;
        let sessions = SessionService::new(&state);

        let token = JwtTestUtils::create_expired_token(user.id, &state.config.jwt_secret);
        let status = sessions.verify_session(&token).await.unwrap();

        assert_eq!(status, SessionStatus::Expired);
    }

    #[tokio::test]
    async fn test_signed_token_without_session_row_is_invalid() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Patient).await;
        let sessions = SessionService::new(&state);

        let token = JwtTestUtils::create_test_token(user.id, &state.config.jwt_secret, Some(30));
        assert_eq!(sessions.verify_session(&token).await.unwrap(), SessionStatus::Invalid);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Secretary).await;
        let sessions = SessionService::new(&state);

        let tokens = sessions.issue_session(user.id).await.unwrap();

        assert_eq!(
            sessions.verify_session(&tokens.refresh_token).await.unwrap(),
            SessionStatus::Invalid
        );
        assert_eq!(sessions.verify_refresh_token(&tokens.refresh_token).unwrap(), user.id);
        assert!(sessions.verify_refresh_token(&tokens.access_token).is_err());
    }

    #[tokio::test]
    async fn test_malformed_and_forged_tokens_are_invalid() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Patient).await;
        let sessions = SessionService::new(&state);

        let forged = JwtTestUtils::create_invalid_signature_token(user.id);
        assert_eq!(sessions.verify_session(&forged).await.unwrap(), SessionStatus::Invalid);

        let malformed = JwtTestUtils::create_malformed_token();
        assert_eq!(sessions.verify_session(&malformed).await.unwrap(), SessionStatus::Invalid);
    }

    #[tokio::test]
    async fn test_stale_session_row_is_invalid_and_removed() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Patient).await;
        let sessions = SessionService::new(&state);

        let tokens = sessions.issue_session(user.id).await.unwrap();
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind(Utc::now() - Duration::minutes(1))
            .bind(&tokens.access_token)
            .execute(&state.db)
            .await
            .unwrap();

        assert_eq!(
            sessions.verify_session(&tokens.access_token).await.unwrap(),
            SessionStatus::Invalid
        );
        assert_eq!(sessions.end_session(&tokens.access_token).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let state = test_state().await;
        let user = seed_user(&state, Role::Patient).await;
        let sessions = SessionService::new(&state);

        let live = sessions.issue_session(user.id).await.unwrap();
        let stale = sessions.issue_session(user.id).await.unwrap();
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind(Utc::now() - Duration::hours(1))
            .bind(&stale.access_token)
            .execute(&state.db)
            .await
            .unwrap();

        assert_eq!(sessions.purge_expired().await.unwrap(), 1);
        assert_matches!(
            sessions.verify_session(&live.access_token).await.unwrap(),
            SessionStatus::Valid(_)
        );
    }
}
