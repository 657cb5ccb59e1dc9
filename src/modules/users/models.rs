use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Internal sequential id; never leaves the service
    pub id: i64,
    /// Opaque external identifier, the subject of session tokens
    pub public_id: Uuid,
    pub name: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// Stored but not consulted by any authorization rule
    pub admin: bool,
}

/// Registration request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of a user. Carries no credential material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub public_id: String,
    pub name: String,
    pub admin: bool,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            public_id: user.public_id.to_string(),
            name: user.name.clone(),
            admin: user.admin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub token: String,
}
