use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::{JwtClaims, JwtHeader, TokenKind};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("JWT secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

fn mac_for(secret: &str) -> Result<HmacSha256, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| JwtError::Encoding(e.to_string()))
}

/// Build claims for `user_id` valid for `ttl` from now.
pub fn new_claims(user_id: Uuid, kind: TokenKind, ttl: Duration) -> JwtClaims {
    let now = Utc::now();
    JwtClaims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        jti: Uuid::new_v4(),
        typ: kind,
    }
}

/// HS256-sign `claims` into a compact JWT.
pub fn sign_token(claims: &JwtClaims, secret: &str) -> Result<String, JwtError> {
    let mut mac = mac_for(secret)?;

    let header = JwtHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header_json = serde_json::to_vec(&header).map_err(|e| JwtError::Encoding(e.to_string()))?;
    let claims_json = serde_json::to_vec(claims).map_err(|e| JwtError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}

/// Check signature and expiry, returning the claims.
///
/// An expired token with a valid signature yields [`JwtError::Expired`], distinct
/// from every other failure, so callers can prompt for a refresh.
pub fn validate_token(token: &str, secret: &str) -> Result<JwtClaims, JwtError> {
    let mut mac = mac_for(secret)?;

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::Malformed);
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        JwtError::Malformed
    })?;

    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(JwtError::InvalidSignature);
    }

    let claims_json = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| JwtError::Malformed)?;

    let claims: JwtClaims = serde_json::from_slice(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        JwtError::Malformed
    })?;

    let now = Utc::now().timestamp();
    if claims.exp <= now {
        debug!("Token expired at {} (now: {})", claims.exp, now);
        return Err(JwtError::Expired);
    }

    debug!("Token validated successfully for user: {}", claims.sub);
    Ok(claims)
}
