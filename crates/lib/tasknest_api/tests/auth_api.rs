//! Integration tests — drive the real router with an in-memory
//! credential store and assert the auth contract end to end.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response, StatusCode};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tower::ServiceExt;

use tasknest_api::config::ApiConfig;
use tasknest_api::{AppState, services};
use tasknest_core::auth::AuthError;
use tasknest_core::auth::password::hash_password;
use tasknest_core::auth::store::CredentialStore;
use tasknest_core::auth::token::TokenCodec;
use tasknest_core::models::auth::{CredentialRecord, NewCredential, Role};

/// In-memory credential store. The mutex serializes inserts, standing in
/// for the unique index of the PostgreSQL store.
#[derive(Default)]
struct MemoryStore {
    users: Mutex<HashMap<String, CredentialRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    fn seed(&self, username: &str, password: &str, role: Role) {
        let record = CredentialRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            role,
        };
        self.users
            .lock()
            .unwrap()
            .insert(username.to_string(), record);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn insert_if_absent(
        &self,
        new: NewCredential,
    ) -> Result<Option<CredentialRecord>, AuthError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&new.username) {
            return Ok(None);
        }
        let record = CredentialRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: new.username.clone(),
            password_hash: new.password_hash,
            role: new.role,
        };
        users.insert(new.username.clone(), record.clone());
        Ok(Some(record))
    }

    async fn list(&self) -> Result<Vec<CredentialRecord>, AuthError> {
        let mut records: Vec<_> = self.users.lock().unwrap().values().cloned().collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }
}

fn test_secret() -> String {
    BASE64.encode([42u8; 32])
}

/// State with a seeded admin account (`root` / `root-password-1`).
fn test_state(access_ttl_ms: i64) -> AppState {
    let store = MemoryStore::default();
    store.seed("root", "root-password-1", Role::Admin);
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        jwt_secret: test_secret(),
        access_ttl_ms,
        refresh_ttl_ms: 86_400_000,
    };
    AppState {
        store: Arc::new(store),
        codec: TokenCodec::new(&config.jwt_secret, access_ttl_ms, config.refresh_ttl_ms).unwrap(),
        config,
    }
}

fn test_app() -> Router {
    tasknest_api::router(test_state(3_600_000))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn get_with_token(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> Value {
    let resp = post_json(
        app,
        "/api/auth/login",
        json!({"username": username, "password": password}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

#[tokio::test]
async fn register_then_login_round_trips() {
    let app = test_app();

    let resp = post_json(
        &app,
        "/api/auth/register",
        json!({"username": "alice", "password": "hunter2hunter2"}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "USER");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refreshToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["userId"].as_i64().is_some());

    let body = login(&app, "alice", "hunter2hunter2").await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "USER");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app();

    let wrong_password = post_json(
        &app,
        "/api/auth/login",
        json!({"username": "root", "password": "not-the-password"}),
    )
    .await;
    let no_such_user = post_json(
        &app,
        "/api/auth/login",
        json!({"username": "ghost", "password": "whatever123"}),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(no_such_user.status(), StatusCode::UNAUTHORIZED);
    // Identical bodies: nothing distinguishes the two failure causes.
    assert_eq!(
        body_json(wrong_password).await,
        body_json(no_such_user).await
    );
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    let body = json!({"username": "alice", "password": "hunter2hunter2"});

    let first = post_json(&app, "/api/auth/register", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(&app, "/api/auth/register", body).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn weak_registrations_are_rejected() {
    let app = test_app();

    let short = post_json(
        &app,
        "/api/auth/register",
        json!({"username": "alice", "password": "short"}),
    )
    .await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);

    let blank = post_json(
        &app,
        "/api/auth/register",
        json!({"username": "   ", "password": "hunter2hunter2"}),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gate_rejects_missing_and_mangled_tokens() {
    let app = test_app();

    let resp = get_with_token(&app, "/api/users/me", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/api/users/me")
        .header(AUTHORIZATION, "Basic cm9vdDpyb290")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = login(&app, "root", "root-password-1").await;
    let token = body["token"].as_str().unwrap();
    let tampered = format!("{}AAAA", &token[..token.len() - 4]);
    let resp = get_with_token(&app, "/api/users/me", Some(&tampered)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Invalid token");
}

#[tokio::test]
async fn expired_tokens_get_a_distinct_message() {
    let app = tasknest_api::router(test_state(1000));

    let body = login(&app, "root", "root-password-1").await;
    let token = body["token"].as_str().unwrap().to_string();

    let resp = get_with_token(&app, "/api/users/me", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let resp = get_with_token(&app, "/api/users/me", Some(&token)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Token expired");
}

#[tokio::test]
async fn admin_routes_distinguish_401_from_403() {
    let app = test_app();

    // No identity at all: must re-authenticate.
    let resp = get_with_token(&app, "/api/users", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Valid identity, wrong role: lacks permission.
    post_json(
        &app,
        "/api/auth/register",
        json!({"username": "alice", "password": "hunter2hunter2"}),
    )
    .await;
    let alice = login(&app, "alice", "hunter2hunter2").await;
    let resp = get_with_token(&app, "/api/users", alice["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Admin: handler runs.
    let root = login(&app, "root", "root-password-1").await;
    let resp = get_with_token(&app, "/api/users", root["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users = body_json(resp).await;
    let names: Vec<_> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"root".to_string()));
    assert!(names.contains(&"alice".to_string()));
}

#[tokio::test]
async fn user_lookup_allows_self_and_admin_only() {
    let app = test_app();
    for name in ["alice", "bob"] {
        post_json(
            &app,
            "/api/auth/register",
            json!({"username": name, "password": "hunter2hunter2"}),
        )
        .await;
    }
    let alice = login(&app, "alice", "hunter2hunter2").await;
    let bob = login(&app, "bob", "hunter2hunter2").await;
    let root = login(&app, "root", "root-password-1").await;

    let resp = get_with_token(&app, "/api/users/alice", alice["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["username"], "alice");

    let resp = get_with_token(&app, "/api/users/alice", root["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get_with_token(&app, "/api/users/alice", bob["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn me_returns_the_callers_account() {
    let app = test_app();
    let root = login(&app, "root", "root-password-1").await;

    let resp = get_with_token(&app, "/api/users/me", root["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["username"], "root");
    assert_eq!(body["role"], "ADMIN");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn refresh_exchanges_tokens() {
    let app = test_app();
    let root = login(&app, "root", "root-password-1").await;

    let resp = post_json(
        &app,
        "/api/auth/refresh",
        json!({"refreshToken": root["refreshToken"]}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["username"], "root");

    let resp = get_with_token(&app, "/api/users/me", body["token"].as_str()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // An access token is not accepted as a refresh token.
    let resp = post_json(
        &app,
        "/api/auth/refresh",
        json!({"refreshToken": root["token"]}),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn concurrent_registrations_create_at_most_one_account() {
    let state = test_state(3_600_000);
    let store = state.store.clone();
    let codec = state.codec.clone();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let codec = codec.clone();
        handles.push(tokio::spawn(async move {
            services::auth::register(store.as_ref(), &codec, "carol", "hunter2hunter2").await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(tasknest_api::error::AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 15);
}
