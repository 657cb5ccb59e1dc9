//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use base64::Engine as _;
use booker_app::Application;
use booker_db::Database;
use booker_kernel::settings::Settings;
use serde_json::Value;
use tower::ServiceExt;

/// A fully bootstrapped application over an in-memory database.
pub struct TestApp {
    pub app: Application,
    pub router: Router,
    pub settings: Settings,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Create a test application with default settings
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Settings::default()).await
}

pub async fn spawn_app_with(settings: Settings) -> TestApp {
    let db = Arc::new(Database::in_memory().expect("Failed to create test database"));
    let app = booker_app::bootstrap_with(db, &settings)
        .await
        .expect("Failed to bootstrap application");
    let router = app.router(&settings);

    TestApp {
        app,
        router,
        settings,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn register(&self, name: &str, password: &str) -> TestResponse {
        self.send(json_request(
            Method::POST,
            "/register",
            None,
            &serde_json::json!({ "name": name, "password": password }),
        ))
        .await
    }

    pub async fn login(&self, name: &str, password: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/login")
                .header(header::AUTHORIZATION, basic_auth(name, password))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Register `name` and return a fresh session token for it.
    pub async fn register_and_login(&self, name: &str, password: &str) -> String {
        assert_eq!(self.register(name, password).await.status, StatusCode::OK);
        let response = self.login(name, password).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }

    pub async fn create_author(&self, token: &str, body: &Value) -> TestResponse {
        self.send(json_request(Method::POST, "/author", Some(token), body))
            .await
    }

    pub async fn list_authors(&self, token: &str) -> TestResponse {
        self.send(authed(Method::GET, "/authors", token)).await
    }
}

pub fn basic_auth(name: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{name}:{password}"));
    format!("Basic {encoded}")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Bodiless request carrying `token` in the default token header.
pub fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-access-tokens", token)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header("x-access-tokens", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
