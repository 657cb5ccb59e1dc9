//! End-to-end tests driving the composed router in-process.

mod common;

use axum::http::{header, Method, StatusCode};
use booker_authz::{TokenConfig, TokenManager};
use booker_kernel::settings::Settings;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{authed, get, json_request, spawn_app, spawn_app_with};

#[tokio::test]
async fn register_login_create_and_list() {
    let app = spawn_app().await;

    let response = app.register("alice", "pw123").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"message": "registered successfully"}));

    let response = app.login("alice", "pw123").await;
    assert_eq!(response.status, StatusCode::OK);
    let token = response.body["token"].as_str().unwrap().to_string();

    // The token decodes back to alice's public id.
    let alice = app.app.context.users.find_by_name("alice").unwrap().unwrap();
    let claims = app.app.context.session.tokens().decode(&token).unwrap();
    assert_eq!(claims.public_id().unwrap(), alice.public_id);

    let response = app
        .create_author(&token, &json!({"name": "N", "book": "B", "country": "C"}))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"message": "new author created"}));

    let response = app.list_authors(&token).await;
    assert_eq!(response.status, StatusCode::OK);
    let authors = response.body["list_of_authors"].as_array().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["name"], "N");
    assert_eq!(authors[0]["book"], "B");
    assert_eq!(authors[0]["country"], "C");
    assert_eq!(authors[0]["booker_prize"], false);
    assert!(authors[0]["id"].is_i64());
    assert!(authors[0].get("user_id").is_none());
}

#[tokio::test]
async fn listing_also_answers_post() {
    let app = spawn_app().await;
    let token = app.register_and_login("alice", "pw123").await;

    let response = app.send(authed(Method::POST, "/authors", &token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"list_of_authors": []}));
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = spawn_app().await;

    for uri in ["/authors", "/users"] {
        let response = app.send(get(uri)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body["message"], "a valid token is missing");
        assert!(!response.headers.contains_key(header::WWW_AUTHENTICATE));
    }

    let response = app.send(authed(Method::GET, "/authors", "  ")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_forbidden() {
    let app = spawn_app().await;

    let response = app.send(authed(Method::GET, "/authors", "not-a-jwt")).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "token is invalid");
    assert_eq!(response.body["error"]["code"], "malformed_token");
}

#[tokio::test]
async fn expired_token_is_forbidden() {
    let app = spawn_app().await;
    app.register_and_login("alice", "pw123").await;
    let alice = app.app.context.users.find_by_name("alice").unwrap().unwrap();

    let issued_at = Utc::now() - Duration::minutes(app.settings.auth.token_ttl_minutes + 1);
    let stale = app
        .app
        .context
        .session
        .tokens()
        .issue_at(alice.public_id, issued_at)
        .unwrap();

    let response = app.list_authors(&stale.token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Token expired, log in again");
}

#[tokio::test]
async fn foreign_signature_is_forbidden() {
    let app = spawn_app().await;
    app.register_and_login("alice", "pw123").await;
    let alice = app.app.context.users.find_by_name("alice").unwrap().unwrap();

    let forged = TokenManager::new(TokenConfig::new("some-other-secret", 60))
        .issue(alice.public_id)
        .unwrap();

    let response = app.list_authors(&forged.token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "Invalid token. Please log in again.");
}

#[tokio::test]
async fn token_for_unknown_user_is_forbidden() {
    let app = spawn_app().await;
    let orphan = app
        .app
        .context
        .session
        .tokens()
        .issue(uuid::Uuid::new_v4())
        .unwrap();

    let response = app.list_authors(&orphan.token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"]["code"], "invalid_signature");
}

#[tokio::test]
async fn users_listing_hides_password_hashes() {
    let app = spawn_app().await;
    let token = app.register_and_login("alice", "pw123").await;
    app.register("bob", "hunter2").await;

    let response = app.send(authed(Method::GET, "/users", &token)).await;
    assert_eq!(response.status, StatusCode::OK);

    let users = response.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        let fields: Vec<_> = user.as_object().unwrap().keys().cloned().collect();
        assert_eq!(fields.len(), 3, "{fields:?}");
        assert!(user["public_id"].is_string());
        assert_eq!(user["admin"], false);
    }
    assert!(!response.body.to_string().contains("argon2"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = spawn_app().await;
    assert_eq!(app.register("alice", "pw123").await.status, StatusCode::OK);

    let response = app.register("alice", "other").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "name already registered");
}

#[tokio::test]
async fn registration_requires_name_and_password() {
    let app = spawn_app().await;

    let response = app
        .send(json_request(Method::POST, "/register", None, &json!({"name": "alice"})))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn bad_credentials_get_basic_challenge() {
    let app = spawn_app().await;
    app.register("alice", "pw123").await;

    for (name, password) in [("alice", "wrong"), ("mallory", "pw123")] {
        let response = app.login(name, password).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["message"], "could not verify");
        assert_eq!(
            response.headers.get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"login required\""
        );
    }

    let response = app.send(get("/login")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.headers.contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn author_creation_requires_fields() {
    let app = spawn_app().await;
    let token = app.register_and_login("alice", "pw123").await;

    let response = app
        .create_author(&token, &json!({"name": "N", "book": " "}))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let details = response.body["error"]["details"].to_string();
    assert!(details.contains("book"));
    assert!(details.contains("country"));
}

#[tokio::test]
async fn booker_prize_flag_is_recorded() {
    let app = spawn_app().await;
    let token = app.register_and_login("alice", "pw123").await;

    app.create_author(
        &token,
        &json!({"name": "Mantel", "book": "Wolf Hall", "country": "UK", "booker_prize": true}),
    )
    .await;

    let response = app.list_authors(&token).await;
    assert_eq!(response.body["list_of_authors"][0]["booker_prize"], true);
}

#[tokio::test]
async fn authors_are_isolated_between_users() {
    let app = spawn_app().await;
    let alice = app.register_and_login("alice", "pw123").await;
    let bob = app.register_and_login("bob", "hunter2").await;

    app.create_author(&alice, &json!({"name": "A", "book": "AB", "country": "C"}))
        .await;
    app.create_author(&bob, &json!({"name": "B", "book": "BB", "country": "C"}))
        .await;

    let alices = app.list_authors(&alice).await.body;
    let names: Vec<_> = alices["list_of_authors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["A"]);

    // Bob cannot delete Alice's record; it looks like it does not exist.
    let alice_author_id = alices["list_of_authors"][0]["id"].as_i64().unwrap();
    let response = app
        .send(authed(
            Method::DELETE,
            &format!("/authors/{alice_author_id}"),
            &bob,
        ))
        .await;
    assert_eq!(response.body, json!({"message": "author does not exist"}));
    assert_eq!(
        app.list_authors(&alice).await.body["list_of_authors"]
            .as_array()
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = spawn_app().await;
    let token = app.register_and_login("alice", "pw123").await;
    app.create_author(&token, &json!({"name": "N", "book": "B", "country": "C"}))
        .await;
    let id = app.list_authors(&token).await.body["list_of_authors"][0]["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/authors/{id}");

    let first = app.send(authed(Method::DELETE, &uri, &token)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, json!({"message": "Author deleted"}));

    let second = app.send(authed(Method::DELETE, &uri, &token)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body, json!({"message": "author does not exist"}));
}

#[tokio::test]
async fn duplicate_author_for_same_user_conflicts() {
    let app = spawn_app().await;
    let token = app.register_and_login("alice", "pw123").await;
    let author = json!({"name": "N", "book": "B", "country": "C"});

    assert_eq!(app.create_author(&token, &author).await.status, StatusCode::OK);
    assert_eq!(
        app.create_author(&token, &author).await.status,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn token_header_is_configurable() {
    let mut settings = Settings::default();
    settings.auth.token_header = "X-Session".to_string();
    let app = spawn_app_with(settings).await;
    let token = app.register_and_login("alice", "pw123").await;

    // The default header is no longer consulted.
    let response = app.list_authors(&token).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let request = axum::http::Request::builder()
        .uri("/authors")
        .header("x-session", &token)
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status, StatusCode::OK);

    let docs = app.send(get("/docs/openapi.json")).await;
    assert_eq!(
        docs.body["components"]["securitySchemes"]["accessToken"]["name"],
        "X-Session"
    );
}

#[tokio::test]
async fn health_and_docs_are_public() {
    let app = spawn_app().await;

    let response = app.send(get("/healthz")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!("ok"));

    let response = app.send(get("/docs/openapi.json")).await;
    assert_eq!(response.status, StatusCode::OK);
    let paths = response.body["paths"].as_object().unwrap();
    for path in ["/register", "/login", "/users", "/author", "/authors", "/authors/{id}"] {
        assert!(paths.contains_key(path), "{path} missing from OpenAPI");
    }
    assert!(response.body["components"]["schemas"]["NewAuthor"].is_object());
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let app = spawn_app().await;

    let response = app.send(get("/nope")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"]["code"], "not_found");
}
