//! Error types for authentication.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors.
///
/// Display strings are user-facing; they are returned verbatim in the
/// `message` field of HTTP error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was supplied with a protected request
    #[error("a valid token is missing")]
    MissingToken,

    /// Token could not be decoded or its claims are unusable
    #[error("token is invalid")]
    MalformedToken,

    /// Token is past its expiry
    #[error("Token expired, log in again")]
    TokenExpired,

    /// Signature does not match, or the subject no longer exists
    #[error("Invalid token. Please log in again.")]
    InvalidSignature,

    /// Login with an unknown name or wrong password
    #[error("could not verify")]
    InvalidCredentials,

    #[error("internal error: password hashing failed")]
    HashingFailed,

    #[error("internal error: token generation failed")]
    TokenGenerationFailed,

    /// Identity lookup failed for reasons other than "not found"
    #[error("internal error: identity lookup failed")]
    LookupFailed,
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingToken | AuthError::InvalidCredentials => 401,
            AuthError::MalformedToken | AuthError::TokenExpired | AuthError::InvalidSignature => {
                403
            }
            AuthError::HashingFailed
            | AuthError::TokenGenerationFailed
            | AuthError::LookupFailed => 500,
        }
    }

    /// Stable machine-readable code for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::HashingFailed => "hashing_failed",
            AuthError::TokenGenerationFailed => "token_generation_failed",
            AuthError::LookupFailed => "lookup_failed",
        }
    }
}
