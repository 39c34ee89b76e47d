use std::sync::Arc;

use axum::{
    body::Body,
    http::{self, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use todo_app::{
    app::build_app,
    auth::repo::{User, UserStore},
    config::AppConfig,
    memory::MemoryStore,
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

fn test_app() -> Router {
    build_app(AppState::in_memory(Arc::new(AppConfig::for_tests())))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["accessToken"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn todo_routes_require_a_token() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/todo_items", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing Authorization header");

    let (status, _) = send(&app, "GET", "/api/todo_items", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_me() {
    let app = test_app();
    let token = register(&app, "Hello@HelloWorld.com").await;

    let (status, me) = send(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "hello@helloworld.com");
    assert!(me.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "hello@helloworld.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refreshToken"].is_string());

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "hello@helloworld.com", "password": "wrong-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_duplicates_and_weak_input() {
    let app = test_app();
    register(&app, "a@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "a@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "b@example.com", "password": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "nope", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refresh_token_issues_new_access_token() {
    let app = test_app();
    let (_, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "r@example.com", "password": "password123"})),
    )
    .await;
    let refresh = body["refreshToken"].as_str().unwrap();
    let access = body["accessToken"].as_str().unwrap();

    let (status, renewed) = send(&app, "POST", "/api/auth/refresh", None, Some(json!({"refreshToken": refresh}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(renewed["accessToken"].is_string());

    let (status, _) = send(&app, "POST", "/api/auth/refresh", None, Some(json!({"refreshToken": access}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a refresh token is not accepted as an access token
    let (status, _) = send(&app, "GET", "/api/todo_items", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- todo items ---

#[tokio::test]
async fn todo_item_lifecycle() {
    let app = test_app();
    let token = register(&app, "owner@example.com").await;
    let t = Some(token.as_str());

    let (status, created) = send(&app, "POST", "/api/todo_items", t, Some(json!({"content": "Buy milk"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["content"], "Buy milk");
    assert!(created["completedAt"].is_null());

    let (status, done) = send(
        &app,
        "PUT",
        "/api/todo_items/1",
        t,
        Some(json!({"completedAt": "2024-01-01T00:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["completedAt"], "2024-01-01T00:00:00Z");
    assert_eq!(done["content"], "Buy milk");

    let (status, cleared) = send(&app, "PATCH", "/api/todo_items/1", t, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["completedAt"].is_null());

    let (status, shown) = send(&app, "GET", "/api/todo_items/1", t, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["content"], "Buy milk");

    let (status, deleted) = send(&app, "DELETE", "/api/todo_items/1", t, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], 1);
    assert_eq!(deleted["content"], "Buy milk");

    let (status, body) = send(&app, "DELETE", "/api/todo_items/1", t, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "todo item not found");
}

#[tokio::test]
async fn blank_content_is_a_validation_error() {
    let app = test_app();
    let token = register(&app, "v@example.com").await;
    let t = Some(token.as_str());

    for body in [json!({"content": ""}), json!({"content": "   "}), json!({})] {
        let (status, err) = send(&app, "POST", "/api/todo_items", t, Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["field"], "content");
    }

    let (_, items) = send(&app, "GET", "/api/todo_items", t, None).await;
    assert_eq!(items, json!([]));
}

#[tokio::test]
async fn create_trims_and_accepts_wrapped_body() {
    let app = test_app();
    let token = register(&app, "w@example.com").await;
    let t = Some(token.as_str());

    let (status, created) = send(
        &app,
        "POST",
        "/api/todo_items",
        t,
        Some(json!({"todo_item": {"content": "  Walk dog  ", "completed_at": "2024-03-01T12:00:00Z"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["content"], "Walk dog");
    assert_eq!(created["completedAt"], "2024-03-01T12:00:00Z");
}

#[tokio::test]
async fn malformed_json_gets_a_json_error_body() {
    let app = test_app();
    let token = register(&app, "m@example.com").await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/todo_items")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn list_is_scoped_to_owner_and_filterable() {
    let app = test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    for content in ["Buy milk", "Buy eggs", "Walk dog"] {
        send(&app, "POST", "/api/todo_items", Some(&alice), Some(json!({"content": content}))).await;
    }
    send(&app, "POST", "/api/todo_items", Some(&bob), Some(json!({"content": "Buy bread"}))).await;

    let (_, all) = send(&app, "GET", "/api/todo_items", Some(&alice), None).await;
    let contents: Vec<&str> = all.as_array().unwrap().iter().map(|t| t["content"].as_str().unwrap()).collect();
    assert_eq!(contents, ["Buy milk", "Buy eggs", "Walk dog"]);

    let (_, hits) = send(&app, "GET", "/api/todo_items?query=Buy", Some(&alice), None).await;
    assert_eq!(hits.as_array().unwrap().len(), 2);

    let (_, none) = send(&app, "GET", "/api/todo_items?query=buy", Some(&alice), None).await;
    assert_eq!(none, json!([]));

    let (_, bobs) = send(&app, "GET", "/api/todo_items", Some(&bob), None).await;
    assert_eq!(bobs.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_items_read_as_not_found() {
    let app = test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let (_, item) = send(&app, "POST", "/api/todo_items", Some(&alice), Some(json!({"content": "private"}))).await;
    let uri = format!("/api/todo_items/{}", item["id"]);

    let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "PUT", &uri, Some(&bob), Some(json!({"content": "mine now"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, still) = send(&app, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still["content"], "private");
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let app = test_app();
    let token = register(&app, "u@example.com").await;
    let (status, _) = send(&app, "PUT", "/api/todo_items/999", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_path_and_query_get_json_error_bodies() {
    let app = test_app();
    let token = register(&app, "p@example.com").await;
    let t = Some(token.as_str());

    for (method, uri) in [
        ("GET", "/api/todo_items/abc"),
        ("DELETE", "/api/todo_items/abc"),
        ("GET", "/api/todo_items/99999999999999999999"),
        ("GET", "/api/todo_items?query=a&query=b"),
    ] {
        let (status, body) = send(&app, method, uri, t, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
        assert!(body["error"].is_string(), "{method} {uri}: {body}");
    }

    let (status, body) = send(&app, "PUT", "/api/todo_items/abc", t, Some(json!({"content": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn update_replaces_trimmed_content_and_clears_completion() {
    let app = test_app();
    let token = register(&app, "edit@example.com").await;
    let t = Some(token.as_str());

    let (_, created) = send(
        &app,
        "POST",
        "/api/todo_items",
        t,
        Some(json!({"content": "old", "completedAt": "2024-01-01T00:00:00Z"})),
    )
    .await;
    let uri = format!("/api/todo_items/{}", created["id"]);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, updated) = send(&app, "PUT", &uri, t, Some(json!({"content": "  new  "}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "new");
    assert!(updated["completedAt"].is_null());
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let before = time::OffsetDateTime::parse(
        created["updatedAt"].as_str().unwrap(),
        &time::format_description::well_known::Rfc3339,
    )
    .unwrap();
    let after = time::OffsetDateTime::parse(
        updated["updatedAt"].as_str().unwrap(),
        &time::format_description::well_known::Rfc3339,
    )
    .unwrap();
    assert!(after > before);

    let (_, shown) = send(&app, "GET", &uri, t, None).await;
    assert_eq!(shown["content"], "new");
}

/// Never finds an existing email, so every duplicate reaches the insert.
struct BlindLookup(MemoryStore);

#[axum::async_trait]
impl UserStore for BlindLookup {
    async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
        Ok(None)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.0.find_by_id(id).await
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<Option<User>> {
        UserStore::create(&self.0, email, password_hash).await
    }
}

#[tokio::test]
async fn duplicate_email_at_insert_time_is_a_conflict() {
    let store = MemoryStore::new();
    let app = build_app(AppState::from_parts(
        Arc::new(store.clone()),
        Arc::new(BlindLookup(store)),
        Arc::new(AppConfig::for_tests()),
    ));
    register(&app, "race@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": "race@example.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email already registered");
}

#[tokio::test]
async fn concurrent_registrations_yield_one_account() {
    let app = test_app();
    let body = json!({"email": "twin@example.com", "password": "password123"});
    let (first, second) = tokio::join!(
        send(&app, "POST", "/api/auth/register", None, Some(body.clone())),
        send(&app, "POST", "/api/auth/register", None, Some(body.clone())),
    );
    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
}
