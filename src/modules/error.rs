//! Errors raised by the module stores.

use booker_authz::AuthError;
use booker_db::DbError;
use booker_http::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl StoreError {
    /// Translate a unique-constraint violation into `Conflict(message)`.
    pub fn conflict_or_db(err: DbError, message: &str) -> Self {
        if err.is_unique_violation() {
            StoreError::Conflict(message.to_string())
        } else {
            StoreError::Db(err)
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => AppError::conflict(message),
            StoreError::Auth(e) => AppError::Auth(e),
            StoreError::Db(e) => AppError::Internal(e.into()),
        }
    }
}
