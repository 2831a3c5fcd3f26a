//! Error codes for the contacts backend API.
//!
//! All codes used in HTTP responses live here; never pass ad-hoc strings as
//! error codes. Each variant maps 1:1 to the SCREAMING_SNAKE_CASE string
//! that appears on the wire.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & authorization
    /// Missing or malformed Bearer token
    UnauthorizedMissingBearer,
    /// Invalid JWT token
    UnauthorizedInvalidJwt,
    /// JWT token has expired
    UnauthorizedExpiredJwt,
    /// Unknown email or wrong password at login
    InvalidCredentials,
    /// Login attempted before the email was confirmed
    EmailNotConfirmed,
    /// Presented refresh token does not match the stored one
    InvalidRefreshToken,

    // Token flows
    /// Email-confirmation token failed verification
    InvalidEmailToken,
    /// Password-reset token failed verification
    InvalidResetToken,
    /// Confirmation token decoded but no such account
    VerificationFailed,

    // Request validation
    /// General validation error (422)
    ValidationError,
    /// General bad request (unparseable body, bad header)
    BadRequest,

    // Resource not found
    /// Contact not found (or not owned by the caller)
    ContactNotFound,
    /// User not found
    UserNotFound,
    /// General not found
    NotFound,

    // Conflicts
    /// Signup with an email that already has an account
    AccountExists,
    /// Contact duplicates an existing one of the same owner
    DuplicateContact,

    // Infrastructure
    /// Avatar upload service is not configured
    AvatarUnavailable,
    /// Database error
    DbError,
    /// Database connection is not configured
    DbUnavailable,
    /// Configuration error
    ConfigError,
    /// Internal error
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            ErrorCode::UnauthorizedInvalidJwt => "UNAUTHORIZED_INVALID_JWT",
            ErrorCode::UnauthorizedExpiredJwt => "UNAUTHORIZED_EXPIRED_JWT",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::EmailNotConfirmed => "EMAIL_NOT_CONFIRMED",
            ErrorCode::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            ErrorCode::InvalidEmailToken => "INVALID_EMAIL_TOKEN",
            ErrorCode::InvalidResetToken => "INVALID_RESET_TOKEN",
            ErrorCode::VerificationFailed => "VERIFICATION_FAILED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::ContactNotFound => "CONTACT_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AccountExists => "ACCOUNT_EXISTS",
            ErrorCode::DuplicateContact => "DUPLICATE_CONTACT",
            ErrorCode::AvatarUnavailable => "AVATAR_UNAVAILABLE",
            ErrorCode::DbError => "DB_ERROR",
            ErrorCode::DbUnavailable => "DB_UNAVAILABLE",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
