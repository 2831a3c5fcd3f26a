use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Purpose a token was minted for. Each scope carries its own TTL and a
/// token minted for one purpose is never accepted for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    /// Short-lived API session token.
    Access,
    /// Long-lived token used only to obtain a new session pair.
    Refresh,
    /// Emailed link token proving mailbox ownership.
    Email,
    /// Emailed link token authorizing a password reset.
    PasswordReset,
}

impl TokenScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenScope::Access => "access_token",
            TokenScope::Refresh => "refresh_token",
            TokenScope::Email => "email_token",
            TokenScope::PasswordReset => "password_reset_token",
        }
    }

    /// Lifetime in seconds.
    pub const fn ttl_secs(self) -> i64 {
        match self {
            TokenScope::Access => 15 * 60,
            TokenScope::Refresh => 7 * 86_400,
            TokenScope::Email => 7 * 86_400,
            TokenScope::PasswordReset => 45 * 60,
        }
    }
}

/// Claims included in backend-issued tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account email the token was minted for.
    pub sub: String,
    /// Purpose marker, see [`TokenScope`].
    pub scope: String,
    /// Unique token id; two mints in the same second must not collide,
    /// refresh rotation depends on it.
    pub jti: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Why a token failed verification. Callers map these to endpoint-specific
/// status codes, so this stays separate from [`AppError`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("wrong scope: expected {expected}, got {actual}")]
    WrongScope {
        expected: &'static str,
        actual: String,
    },
    #[error("malformed token")]
    Malformed,
}

/// Mint a HS256 JWT for `email` with the scope's TTL.
pub fn mint_token(
    email: &str,
    scope: TokenScope,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time"))?
        .as_secs() as i64;

    let claims = Claims {
        sub: email.to_string(),
        scope: scope.as_str().to_string(),
        jti: uuid::Uuid::new_v4().to_string(),
        iat,
        exp: iat + scope.ttl_secs(),
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify a JWT, require the expected scope, and return its claims.
pub fn verify_token(
    token: &str,
    expected: TokenScope,
    security: &SecurityConfig,
) -> Result<Claims, TokenError> {
    // Default Validation already checks exp; pin algorithm to configured algorithm.
    let validation = Validation::new(security.algorithm);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    })?;

    if claims.scope != expected.as_str() {
        return Err(TokenError::WrongScope {
            expected: expected.as_str(),
            actual: claims.scope,
        });
    }

    Ok(claims)
}
