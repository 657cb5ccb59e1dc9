//! Token → live identity resolution.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::token::TokenManager;

/// Looks up the identity a token's subject refers to.
#[async_trait]
pub trait SubjectResolver: Send + Sync {
    type Subject: Send;

    /// `Ok(None)` when no such identity exists (anymore).
    async fn resolve(&self, public_id: Uuid) -> anyhow::Result<Option<Self::Subject>>;
}

/// Verifies a raw token and resolves it to a live subject.
pub struct Authenticator<R> {
    tokens: TokenManager,
    resolver: Arc<R>,
}

impl<R> Clone for Authenticator<R> {
    fn clone(&self) -> Self {
        Self {
            tokens: self.tokens.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<R: SubjectResolver> Authenticator<R> {
    pub fn new(tokens: TokenManager, resolver: Arc<R>) -> Self {
        Self { tokens, resolver }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Authenticate a raw token taken from a request.
    ///
    /// A token whose subject no longer resolves is treated like a bad
    /// signature: the caller is simply unauthenticated.
    pub async fn authenticate(&self, token: &str) -> AuthResult<R::Subject> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.tokens.decode(token)?;
        let public_id = claims.public_id()?;

        match self.resolver.resolve(public_id).await {
            Ok(Some(subject)) => Ok(subject),
            Ok(None) => {
                tracing::debug!(%public_id, "token subject does not resolve to a user");
                Err(AuthError::InvalidSignature)
            }
            Err(e) => {
                tracing::error!(%public_id, error = %e, "identity lookup failed");
                Err(AuthError::LookupFailed)
            }
        }
    }
}
