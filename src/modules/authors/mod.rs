pub mod models;
pub mod store;

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use booker_http::error::AppError;
use booker_kernel::{InitCtx, Migration, Module};
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::modules::session::{require_token, CurrentUser};
use crate::utils::blank_fields;
use models::{AuthorList, NewAuthor};

/// Per-user author records. Every route requires a session token.
pub struct AuthorsModule {
    ctx: AppContext,
}

impl AuthorsModule {
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                book TEXT NOT NULL,
                country TEXT NOT NULL,
                booker_prize INTEGER NOT NULL DEFAULT 0,
                user_id INTEGER NOT NULL REFERENCES users(id),
                UNIQUE (user_id, name),
                UNIQUE (user_id, book)
            );
            CREATE INDEX IF NOT EXISTS idx_authors_user_id ON authors(user_id);
            "#,
    }]
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "authors module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/author", post(create_author))
            .route("/authors", get(list_authors).post(list_authors))
            .route("/authors/{id}", delete(delete_author))
            .route_layer(middleware::from_fn_with_state(
                self.ctx.session.clone(),
                require_token,
            ))
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<Value> {
        let unauthenticated = json!({
            "401": {"description": "Token missing", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
            "403": {"description": "Token invalid or expired", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
        });

        let mut create = json!({
            "200": {"description": "Created", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Message"}}}},
            "409": {"description": "Name or book already recorded", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
            "422": {"description": "Missing fields", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
        });
        let mut list = json!({
            "200": {"description": "Caller's authors", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/AuthorList"}}}}
        });
        let mut remove = json!({
            "200": {"description": "Deleted, or no such author for this caller", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Message"}}}}
        });
        for responses in [&mut create, &mut list, &mut remove] {
            merge_objects(responses, &unauthenticated);
        }

        Some(json!({
            "paths": {
                "/author": {
                    "post": {
                        "summary": "Record an author",
                        "tags": ["Authors"],
                        "security": [{"accessToken": []}],
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/NewAuthor"}}}
                        },
                        "responses": create
                    }
                },
                "/authors": {
                    "get": {
                        "summary": "List the caller's authors",
                        "tags": ["Authors"],
                        "security": [{"accessToken": []}],
                        "responses": list.clone()
                    },
                    "post": {
                        "summary": "List the caller's authors",
                        "tags": ["Authors"],
                        "security": [{"accessToken": []}],
                        "responses": list
                    }
                },
                "/authors/{id}": {
                    "delete": {
                        "summary": "Delete one of the caller's authors",
                        "tags": ["Authors"],
                        "security": [{"accessToken": []}],
                        "parameters": [{
                            "name": "id",
                            "in": "path",
                            "required": true,
                            "schema": {"type": "integer", "format": "int64"}
                        }],
                        "responses": remove
                    }
                }
            },
            "components": {
                "schemas": {
                    "NewAuthor": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "book": {"type": "string"},
                            "country": {"type": "string"},
                            "booker_prize": {"type": "boolean", "default": false}
                        },
                        "required": ["name", "book", "country"]
                    },
                    "Author": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "integer", "format": "int64"},
                            "name": {"type": "string"},
                            "book": {"type": "string"},
                            "country": {"type": "string"},
                            "booker_prize": {"type": "boolean"}
                        },
                        "required": ["id", "name", "book", "country", "booker_prize"]
                    },
                    "AuthorList": {
                        "type": "object",
                        "properties": {
                            "list_of_authors": {
                                "type": "array",
                                "items": {"$ref": "#/components/schemas/Author"}
                            }
                        },
                        "required": ["list_of_authors"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }
}

async fn create_author(
    State(ctx): State<AppContext>,
    CurrentUser(owner): CurrentUser,
    Json(author): Json<NewAuthor>,
) -> Result<Json<Value>, AppError> {
    let missing = blank_fields(&[
        ("name", author.name.as_str()),
        ("book", author.book.as_str()),
        ("country", author.country.as_str()),
    ]);
    if !missing.is_empty() {
        return Err(AppError::missing_fields(&missing));
    }

    ctx.authors.create(owner.id, &author)?;
    Ok(Json(json!({"message": "new author created"})))
}

async fn list_authors(
    State(ctx): State<AppContext>,
    CurrentUser(owner): CurrentUser,
) -> Result<Json<AuthorList>, AppError> {
    let list_of_authors = ctx.authors.list_by_owner(owner.id)?;
    Ok(Json(AuthorList { list_of_authors }))
}

async fn delete_author(
    State(ctx): State<AppContext>,
    CurrentUser(owner): CurrentUser,
    Path(author_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let message = if ctx.authors.delete_by_owner_and_id(owner.id, author_id)? {
        "Author deleted"
    } else {
        "author does not exist"
    };
    Ok(Json(json!({ "message": message })))
}

fn merge_objects(target: &mut Value, extra: &Value) {
    if let (Some(target), Some(extra)) = (target.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            target.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

/// Create a new instance of the authors module
pub fn create_module(ctx: AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthorsModule::new(ctx))
}
