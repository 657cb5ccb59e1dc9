pub mod models;
pub mod store;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    middleware,
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use booker_authz::AuthError;
use booker_http::error::AppError;
use booker_kernel::{InitCtx, Migration, Module};
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::modules::session::{require_token, CurrentUser};
use crate::utils::blank_fields;
use models::{RegisterUser, TokenBody, UserList, UserSummary};

/// Registration, login, and the user directory.
pub struct UsersModule {
    ctx: AppContext,
}

impl UsersModule {
    pub const fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                public_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                admin INTEGER NOT NULL DEFAULT 0
            );
            "#,
    }]
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            token_ttl_minutes = ctx.settings.auth.token_ttl_minutes,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let protected = Router::new()
            .route("/users", get(list_users))
            .route_layer(middleware::from_fn_with_state(
                self.ctx.session.clone(),
                require_token,
            ));

        Router::new()
            .route("/register", post(register))
            .route("/login", get(login).post(login))
            .merge(protected)
            .with_state(self.ctx.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(json!({
            "paths": {
                "/register": {
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/RegisterUser"}}}
                        },
                        "responses": {
                            "200": {"description": "Registered", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Message"}}}},
                            "409": {"description": "Name already registered", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "422": {"description": "Missing name or password", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Exchange Basic credentials for a session token",
                        "tags": ["Users"],
                        "security": [{"basicAuth": []}],
                        "responses": {
                            "200": {"description": "Session token", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Token"}}}},
                            "401": {"description": "Could not verify", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                },
                "/users": {
                    "get": {
                        "summary": "List registered users",
                        "tags": ["Users"],
                        "security": [{"accessToken": []}],
                        "responses": {
                            "200": {"description": "Users", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/UserList"}}}},
                            "401": {"description": "Token missing", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}},
                            "403": {"description": "Token invalid or expired", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ErrorResponse"}}}}
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "RegisterUser": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "password": {"type": "string", "format": "password"}
                        },
                        "required": ["name", "password"]
                    },
                    "Token": {
                        "type": "object",
                        "properties": {"token": {"type": "string"}},
                        "required": ["token"]
                    },
                    "UserList": {
                        "type": "object",
                        "properties": {
                            "users": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "public_id": {"type": "string", "format": "uuid"},
                                        "name": {"type": "string"},
                                        "admin": {"type": "boolean"}
                                    },
                                    "required": ["public_id", "name", "admin"]
                                }
                            }
                        },
                        "required": ["users"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

async fn register(
    State(ctx): State<AppContext>,
    Json(request): Json<RegisterUser>,
) -> Result<Json<Value>, AppError> {
    let missing = blank_fields(&[
        ("name", request.name.as_str()),
        ("password", request.password.as_str()),
    ]);
    if !missing.is_empty() {
        return Err(AppError::missing_fields(&missing));
    }

    // Argon2 blocks the calling thread.
    let users = ctx.users.clone();
    tokio::task::spawn_blocking(move || users.register(&request.name, &request.password))
        .await
        .map_err(anyhow::Error::from)??;

    Ok(Json(json!({"message": "registered successfully"})))
}

async fn login(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> Result<Json<TokenBody>, AppError> {
    let (name, password) = basic_credentials(&headers).ok_or(AuthError::InvalidCredentials)?;

    let users = ctx.users.clone();
    let user = tokio::task::spawn_blocking(move || users.verify_credentials(&name, &password))
        .await
        .map_err(anyhow::Error::from)??;

    let Some(user) = user else {
        tracing::info!("login rejected");
        return Err(AuthError::InvalidCredentials.into());
    };

    let issued = ctx.session.tokens().issue(user.public_id)?;
    tracing::info!(user_id = user.id, expires_at = %issued.expires_at, "session token issued");

    Ok(Json(TokenBody {
        token: issued.token,
    }))
}

async fn list_users(
    State(ctx): State<AppContext>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<UserList>, AppError> {
    let users = ctx.users.list()?;
    tracing::debug!(caller = caller.id, count = users.len(), "listing users");

    Ok(Json(UserList {
        users: users.iter().map(UserSummary::from).collect(),
    }))
}

/// Decode `Authorization: Basic base64(name:password)`.
///
/// `None` when the header is absent, not Basic, or either part is empty.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, password) = decoded.split_once(':')?;

    if name.is_empty() || password.is_empty() {
        return None;
    }
    Some((name.to_string(), password.to_string()))
}

/// Create a new instance of the users module
pub fn create_module(ctx: AppContext) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(ctx))
}
