// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use simply_track::config::Config;
use simply_track::db::{FirestoreDb, MemoryStore, Store};
use simply_track::routes::create_router;
use simply_track::services::AccessTokenClaims;
use simply_track::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app over a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let db: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::new(Config::test_default(), db).expect("state"));
    (create_router(state.clone()), state)
}

/// Send a request and return status plus parsed JSON body (`Null` if empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Register a user and return the token response body.
#[allow(dead_code)]
pub async fn register(app: &axum::Router, email: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": password,
            "firstName": "Test",
            "lastName": "User",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body
}

/// Access token of a token response body.
#[allow(dead_code)]
pub fn access_token(tokens: &Value) -> String {
    tokens["accessToken"].as_str().unwrap().to_string()
}

/// Refresh token of a token response body.
#[allow(dead_code)]
pub fn refresh_token(tokens: &Value) -> String {
    tokens["refreshToken"].as_str().unwrap().to_string()
}

/// Sign arbitrary access token claims with the test key.
#[allow(dead_code)]
pub fn sign_claims(claims: &AccessTokenClaims, config: &Config) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(&config.jwt_signing_key),
    )
    .expect("Failed to create JWT")
}

/// Claims for `user_id` valid for the next 15 minutes.
#[allow(dead_code)]
pub fn valid_claims(user_id: &str, config: &Config) -> AccessTokenClaims {
    let now = chrono::Utc::now().timestamp();
    AccessTokenClaims {
        sub: user_id.to_string(),
        email: "test@example.com".to_string(),
        given_name: "Test".to_string(),
        family_name: "User".to_string(),
        iss: config.jwt_issuer.clone(),
        aud: config.jwt_audience.clone(),
        iat: now,
        nbf: now,
        exp: now + 900,
        jti: uuid::Uuid::new_v4().to_string(),
    }
}
