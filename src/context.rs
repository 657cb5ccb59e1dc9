//! Shared application state handed to every module.

use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderName;
use booker_authz::{Authenticator, PasswordHasher, TokenConfig, TokenManager};
use booker_db::Database;
use booker_kernel::settings::AuthSettings;

use crate::modules::{authors::store::AuthorStore, session::SessionGuard, users::store::UserStore};

#[derive(Clone)]
pub struct AppContext {
    pub db: Arc<Database>,
    pub users: Arc<UserStore>,
    pub authors: Arc<AuthorStore>,
    pub session: SessionGuard,
}

impl AppContext {
    /// Wire stores and the session guard around an opened database.
    pub fn new(db: Arc<Database>, auth: &AuthSettings) -> anyhow::Result<Self> {
        let users = Arc::new(
            UserStore::new(Arc::clone(&db), PasswordHasher::new())
                .context("failed to initialize credential store")?,
        );
        let authors = Arc::new(AuthorStore::new(Arc::clone(&db)));

        let tokens = TokenManager::new(TokenConfig::new(
            auth.secret_key.clone(),
            auth.token_ttl_minutes,
        ));
        let header = HeaderName::from_bytes(auth.token_header.to_ascii_lowercase().as_bytes())
            .with_context(|| format!("invalid token header name '{}'", auth.token_header))?;
        let session = SessionGuard::new(Authenticator::new(tokens, Arc::clone(&users)), header);

        Ok(Self {
            db,
            users,
            authors,
            session,
        })
    }
}
