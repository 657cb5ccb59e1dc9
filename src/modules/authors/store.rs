//! Owner-scoped author repository backed by the `authors` table.
//!
//! Every query filters on the owning user's internal id; there is no way to
//! reach another user's rows through this type.

use std::sync::Arc;

use booker_db::Database;
use rusqlite::Row;

use super::models::{AuthorRecord, NewAuthor};
use crate::modules::error::StoreError;

pub struct AuthorStore {
    db: Arc<Database>,
}

impl AuthorStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persist a new author for `owner_id`.
    pub fn create(&self, owner_id: i64, author: &NewAuthor) -> Result<AuthorRecord, StoreError> {
        let record = AuthorRecord {
            id: 0,
            name: author.name.trim().to_string(),
            book: author.book.trim().to_string(),
            country: author.country.trim().to_string(),
            booker_prize: author.booker_prize,
            user_id: owner_id,
        };

        let id = self
            .db
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO authors (name, book, country, booker_prize, user_id)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        record.name,
                        record.book,
                        record.country,
                        record.booker_prize,
                        owner_id
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .map_err(|e| {
                StoreError::conflict_or_db(e, "an author with this name or book already exists")
            })?;

        tracing::info!(author_id = id, owner_id, "author created");
        Ok(AuthorRecord { id, ..record })
    }

    /// All authors owned by `owner_id`, in insertion order.
    pub fn list_by_owner(&self, owner_id: i64) -> Result<Vec<AuthorRecord>, StoreError> {
        let authors = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, book, country, booker_prize, user_id
                 FROM authors
                 WHERE user_id = ?1
                 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([owner_id], author_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        Ok(authors)
    }

    /// Delete `author_id` if it exists and belongs to `owner_id`.
    ///
    /// Returns `false` for both "no such author" and "someone else's author".
    pub fn delete_by_owner_and_id(&self, owner_id: i64, author_id: i64) -> Result<bool, StoreError> {
        let deleted = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM authors WHERE id = ?1 AND user_id = ?2",
                [author_id, owner_id],
            )
        })?;

        if deleted > 0 {
            tracing::info!(author_id, owner_id, "author deleted");
        }
        Ok(deleted > 0)
    }
}

fn author_from_row(row: &Row<'_>) -> rusqlite::Result<AuthorRecord> {
    Ok(AuthorRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        book: row.get(2)?,
        country: row.get(3)?,
        booker_prize: row.get(4)?,
        user_id: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::test_support::{migrated_db, seed_user};

    fn new_author(name: &str, book: &str) -> NewAuthor {
        NewAuthor {
            name: name.to_string(),
            book: book.to_string(),
            country: "C".to_string(),
            booker_prize: false,
        }
    }

    #[test]
    fn create_and_list_in_insertion_order() {
        let db = migrated_db();
        let owner = seed_user(&db, "alice");
        let authors = AuthorStore::new(db);

        let first = authors.create(owner, &new_author("N1", "B1")).unwrap();
        let second = authors.create(owner, &new_author("N2", "B2")).unwrap();

        let listed = authors.list_by_owner(owner).unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[test]
    fn booker_prize_input_is_kept() {
        let db = migrated_db();
        let owner = seed_user(&db, "alice");
        let authors = AuthorStore::new(db);

        let winner = NewAuthor {
            booker_prize: true,
            ..new_author("Mantel", "Wolf Hall")
        };
        authors.create(owner, &winner).unwrap();
        authors.create(owner, &new_author("Other", "Book")).unwrap();

        let flags: Vec<bool> = authors
            .list_by_owner(owner)
            .unwrap()
            .iter()
            .map(|a| a.booker_prize)
            .collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn listing_is_isolated_per_owner() {
        let db = migrated_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let authors = AuthorStore::new(db);

        authors.create(alice, &new_author("A", "Alice's book")).unwrap();
        authors.create(bob, &new_author("B", "Bob's book")).unwrap();
        // Same name and book under a different owner is allowed.
        authors.create(bob, &new_author("A", "Alice's book")).unwrap();

        let alices = authors.list_by_owner(alice).unwrap();
        assert_eq!(alices.len(), 1);
        assert!(alices.iter().all(|a| a.user_id == alice));

        let bobs = authors.list_by_owner(bob).unwrap();
        assert_eq!(bobs.len(), 2);
        assert!(bobs.iter().all(|a| a.user_id == bob));
    }

    #[test]
    fn duplicate_for_same_owner_is_conflict() {
        let db = migrated_db();
        let owner = seed_user(&db, "alice");
        let authors = AuthorStore::new(db);

        authors.create(owner, &new_author("N", "B")).unwrap();
        let err = authors.create(owner, &new_author("N", "Other")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn delete_is_owner_scoped_and_idempotent() {
        let db = migrated_db();
        let alice = seed_user(&db, "alice");
        let bob = seed_user(&db, "bob");
        let authors = AuthorStore::new(db);

        let record = authors.create(alice, &new_author("N", "B")).unwrap();

        assert!(!authors.delete_by_owner_and_id(bob, record.id).unwrap());
        assert_eq!(authors.list_by_owner(alice).unwrap().len(), 1);

        assert!(authors.delete_by_owner_and_id(alice, record.id).unwrap());
        assert!(!authors.delete_by_owner_and_id(alice, record.id).unwrap());
        assert!(!authors.delete_by_owner_and_id(alice, 9999).unwrap());
        assert!(authors.list_by_owner(alice).unwrap().is_empty());
    }
}
