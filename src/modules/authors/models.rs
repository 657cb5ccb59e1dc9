use serde::{Deserialize, Serialize};

/// An author record owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: i64,
    pub name: String,
    pub book: String,
    pub country: String,
    pub booker_prize: bool,
    /// Owning user's internal id
    #[serde(skip)]
    pub user_id: i64,
}

/// Request model for creating a new author.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub book: String,
    #[serde(default)]
    pub country: String,
    /// Defaults to `false` when omitted
    #[serde(default)]
    pub booker_prize: bool,
}

#[derive(Debug, Serialize)]
pub struct AuthorList {
    pub list_of_authors: Vec<AuthorRecord>,
}
