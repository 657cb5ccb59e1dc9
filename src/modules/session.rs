//! Token authentication for protected routes.
//!
//! [`require_token`] is layered onto protected routers with
//! `axum::middleware::from_fn_with_state`. It authenticates the raw token
//! from the configured header and stores the resolved user in the request
//! extensions, where handlers pick it up through the [`CurrentUser`]
//! extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderName},
    middleware::Next,
    response::Response,
};
use booker_authz::{AuthError, Authenticator, TokenManager};
use booker_http::error::AppError;

use super::users::{models::UserRecord, store::UserStore};

/// Authenticator plus the header the token travels in.
#[derive(Clone)]
pub struct SessionGuard {
    authenticator: Authenticator<UserStore>,
    header: HeaderName,
}

impl SessionGuard {
    pub fn new(authenticator: Authenticator<UserStore>, header: HeaderName) -> Self {
        Self {
            authenticator,
            header,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        self.authenticator.tokens()
    }

    async fn authenticate(&self, parts: &Parts) -> Result<UserRecord, AuthError> {
        let token = parts
            .headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.authenticator.authenticate(token).await
    }
}

/// The authenticated caller of a protected route.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Auth(AuthError::MissingToken))
    }
}

/// Reject the request unless it carries a valid token for a live user.
pub async fn require_token(
    State(guard): State<SessionGuard>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = request.into_parts();

    match guard.authenticate(&parts).await {
        Ok(user) => {
            tracing::debug!(user_id = user.id, path = %parts.uri.path(), "request authenticated");
            parts.extensions.insert(CurrentUser(user));
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        Err(e) => {
            tracing::info!(path = %parts.uri.path(), reason = e.code(), "request not authenticated");
            Err(AppError::Auth(e))
        }
    }
}
