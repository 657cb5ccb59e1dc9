//! Session tokens.
//!
//! A session token is a compact HS256 JWT carrying the user's public id as
//! `sub` plus `iat`/`exp` in Unix seconds. Nothing is stored server-side:
//! a token is valid while `now < exp` and its signature matches the
//! configured secret.
//!
//! Issuance is aligned to the whole second, so `iat`, `exp` and
//! [`IssuedToken`] describe exactly the same window.

use chrono::{DateTime, Duration, DurationRound, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Claim set embedded in every session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User's public id
    pub sub: String,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

impl Claims {
    pub fn public_id(&self) -> AuthResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::MalformedToken)
    }
}

/// Signing configuration, supplied at construction.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenConfig {
    /// A TTL too large for `Duration` saturates; issuing with it then fails
    /// with [`AuthError::TokenGenerationFailed`] instead of overflowing.
    pub fn new(secret: impl Into<String>, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::try_minutes(ttl_minutes).unwrap_or(Duration::MAX),
        }
    }
}

/// A freshly minted token and its validity window.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Issuance instant, truncated to the second (`iat`)
    pub issued_at: DateTime<Utc>,
    /// `issued_at + ttl` (`exp`)
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenManager {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenManager {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            ttl: config.ttl,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `public_id`, valid for the configured window from now.
    pub fn issue(&self, public_id: Uuid) -> AuthResult<IssuedToken> {
        self.issue_at(public_id, Utc::now())
    }

    pub fn issue_at(&self, public_id: Uuid, now: DateTime<Utc>) -> AuthResult<IssuedToken> {
        let issued_at = now
            .duration_trunc(Duration::seconds(1))
            .map_err(|e| {
                tracing::error!(error = %e, "failed to align token issue time");
                AuthError::TokenGenerationFailed
            })?;
        let expires_at = issued_at.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(ttl_seconds = self.ttl.num_seconds(), "token expiry out of range");
            AuthError::TokenGenerationFailed
        })?;
        let claims = Claims {
            sub: public_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!(error = %e, "failed to sign session token");
                AuthError::TokenGenerationFailed
            })?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token against the current time.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        self.decode_at(token, Utc::now())
    }

    /// Verify signature and structure, then expiry against `now`.
    ///
    /// Expiry is checked here rather than by `jsonwebtoken` so that the
    /// boundary is exact (`now >= exp` is expired, no leeway) and testable.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;
        let claims = data.claims;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(AuthError::MalformedToken)?;
        if now >= expires_at {
            return Err(AuthError::TokenExpired);
        }

        claims.public_id()?;
        Ok(claims)
    }
}
