//! Shared helpers for the web API tests.
//!
//! Builds the router over an in-memory database and signs session tokens the
//! way the identity provider does.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use danke::web::middleware::{JwtClaims, JwtState};
use danke::web::{create_router, AppState};
use danke::{Database, MemoryNotifier};

/// Secret shared with the identity provider in tests.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// A test server together with the handles the tests inspect.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub notifier: Arc<MemoryNotifier>,
}

/// Create a test server with an in-memory database.
pub async fn create_test_app() -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let notifier = Arc::new(MemoryNotifier::new());

    let app_state = Arc::new(AppState::new(db.clone()).with_notifier(notifier.clone()));
    let jwt_state = Arc::new(JwtState::new(TEST_SECRET));
    let router = create_router(app_state, jwt_state, &[]);

    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        notifier,
    }
}

/// Sign a session token for `user_id` with `email`.
pub fn token_for(user_id: &str, email: &str) -> String {
    let claims = JwtClaims::new(user_id, email, 3600);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// `Authorization` header value for a signed-in user.
pub fn bearer(user_id: &str, email: &str) -> String {
    format!("Bearer {}", token_for(user_id, email))
}

/// Create a board through the API as `user_id` and return its JSON.
pub async fn create_board(server: &TestServer, auth: &str, body: Value) -> Value {
    let mut body = body;
    if body.get("title").is_none() {
        body["title"] = json!("Farewell Alex");
    }
    if body.get("recipient_name").is_none() {
        body["recipient_name"] = json!("Alex");
    }

    let response = server
        .post("/api/boards")
        .add_header(axum::http::header::AUTHORIZATION, auth.to_string())
        .json(&body)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// Create a post through the API and return the raw response.
pub async fn post_message(
    server: &TestServer,
    auth: &str,
    board_id: &str,
    content: &str,
) -> axum_test::TestResponse {
    server
        .post(&format!("/api/boards/{board_id}/posts"))
        .add_header(axum::http::header::AUTHORIZATION, auth.to_string())
        .json(&json!({ "content": content }))
        .await
}
