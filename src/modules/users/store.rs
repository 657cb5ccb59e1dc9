//! Credential store backed by the `users` table.

use std::sync::Arc;

use async_trait::async_trait;
use booker_authz::{PasswordHasher, SubjectResolver};
use booker_db::Database;
use rusqlite::{types::Type, OptionalExtension, Row};
use uuid::Uuid;

use super::models::UserRecord;
use crate::modules::error::StoreError;

const USER_COLUMNS: &str = "id, public_id, name, password, admin";

pub struct UserStore {
    db: Arc<Database>,
    hasher: PasswordHasher,
    /// Verified against when the name is unknown, so both login failures
    /// cost one hash verification.
    decoy_hash: String,
}

impl UserStore {
    pub fn new(db: Arc<Database>, hasher: PasswordHasher) -> Result<Self, StoreError> {
        let decoy_hash = hasher.hash("booker-decoy-password")?;
        Ok(Self {
            db,
            hasher,
            decoy_hash,
        })
    }

    /// Register a new, non-admin user. Names are unique.
    pub fn register(&self, name: &str, password: &str) -> Result<UserRecord, StoreError> {
        let password_hash = self.hasher.hash(password)?;
        let public_id = Uuid::new_v4();
        let name = name.trim().to_string();

        let id = self
            .db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO users (public_id, name, password, admin) VALUES (?1, ?2, ?3, 0)",
                    rusqlite::params![public_id.to_string(), name, password_hash],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .map_err(|e| StoreError::conflict_or_db(e, "name already registered"))?;

        tracing::info!(user_id = id, %public_id, "user registered");

        Ok(UserRecord {
            id,
            public_id,
            name,
            password_hash,
            admin: false,
        })
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_one("name = ?1", name.trim())
    }

    pub fn find_by_public_id(&self, public_id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        self.find_one("public_id = ?1", &public_id.to_string())
    }

    /// Every user, in registration order.
    pub fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let users = self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        Ok(users)
    }

    /// Check a name/password pair. `None` covers both an unknown name and a
    /// wrong password.
    pub fn verify_credentials(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        match self.find_by_name(name)? {
            Some(user) if self.hasher.verify(password, &user.password_hash) => Ok(Some(user)),
            Some(_) => Ok(None),
            None => {
                let _ = self.hasher.verify(password, &self.decoy_hash);
                Ok(None)
            }
        }
    }

    fn find_one(&self, predicate: &str, value: &str) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
        let user = self
            .db
            .with_conn(|conn| conn.query_row(&sql, [value], user_from_row).optional())?;
        Ok(user)
    }
}

#[async_trait]
impl SubjectResolver for UserStore {
    type Subject = UserRecord;

    async fn resolve(&self, public_id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        Ok(self.find_by_public_id(public_id)?)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let public_id: String = row.get(1)?;
    let public_id = Uuid::parse_str(&public_id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(UserRecord {
        id: row.get(0)?,
        public_id,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        admin: row.get(4)?,
    })
}
